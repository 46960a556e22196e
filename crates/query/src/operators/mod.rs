//! Runtime operators.
//!
//! Each operator is both a `Subscriber` (it consumes upstream events) and
//! an `Observable` (it republishes transformed events and can report its
//! current rows). Downstream nodes are held strongly through subscriber
//! lists; upstream back-references are weak, so a graph is owned by its
//! base tables on one end and by whoever holds the root on the other.

pub mod filter;
pub mod lookup;
pub mod mapper;
pub mod subquery;

pub use filter::{Filter, Operand, Predicate};
pub use lookup::IndexedEqLookup;
pub use mapper::{Mapper, RowTransform};
pub use subquery::{
    BoundOperand, BoundPredicate, BoundValue, ChildInstance, CorrelatedSubquery, ProjectedColumn,
    SourceSpec, SubqueryTemplate,
};

use alloc::vec::Vec;
use rill_core::{Observable, Row, WeakObservable};

/// Pulls the current rows of an operator's upstream, empty when the
/// upstream is gone.
pub(crate) fn upstream_rows(upstream: &Option<WeakObservable>) -> Vec<Row> {
    upstream
        .as_ref()
        .and_then(|weak| weak.upgrade())
        .map(|obs| obs.borrow_mut().snapshot())
        .unwrap_or_default()
}
