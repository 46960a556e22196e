//! Query planner.
//!
//! Lowers a `Select` AST into a `SubqueryTemplate` and instantiates the
//! template into a live operator graph:
//!
//! - the FROM table is the source observable;
//! - the first equality predicate whose column carries an index becomes an
//!   `IndexedEqLookup` source (predicates are considered in `WHERE` order);
//!   every other predicate becomes a `Filter`;
//! - equality against the enclosing scope's columns becomes a correlation
//!   binding, resolved per outer row;
//! - nested selects become child templates consumed by a
//!   `CorrelatedSubquery`;
//! - the final node is a `Mapper` shaping rows to the select list, naming
//!   columns by alias or `table.col`.
//!
//! Resolution failures (unknown tables or columns, references to tables
//! outside the scope chain, comparisons across types) are plan-time errors.

use crate::ast::{CmpOp, Expr, Select, SelectedValue, WherePredicate};
use crate::operators::{
    BoundOperand, BoundPredicate, BoundValue, ChildInstance, ProjectedColumn, SourceSpec,
    SubqueryTemplate,
};
use crate::parser::parse_select;
use crate::tokenizer::tokenize;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use rill_core::{Column, DataType, Error, Observable, ObservableRef, Result, Row, RowSchema, Value};
use rill_storage::Catalog;

/// A compiled query holding the root observable of its operator graph.
///
/// Dropping the `LiveQuery` unsubscribes the graph from its base tables.
pub struct LiveQuery {
    instance: ChildInstance,
}

impl core::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LiveQuery").finish()
    }
}

impl LiveQuery {
    /// Returns the root observable.
    pub fn observable(&self) -> ObservableRef {
        self.instance.root()
    }

    /// Returns the output schema.
    pub fn schema(&self) -> Rc<RowSchema> {
        self.observable().borrow().row_schema()
    }

    /// Returns the current result rows.
    pub fn snapshot(&self) -> Vec<Row> {
        self.observable().borrow_mut().snapshot()
    }
}

/// Compiles query text against a catalog.
pub fn compile(src: &str, catalog: &Catalog) -> Result<LiveQuery> {
    build_query(&parse_select(tokenize(src)?)?, catalog)
}

/// Lowers a parsed select into a live operator graph.
pub fn build_query(select: &Select, catalog: &Catalog) -> Result<LiveQuery> {
    let template = build_template(select, catalog, None)?;
    Ok(LiveQuery {
        instance: template.instantiate(None),
    })
}

/// The enclosing select a subquery may reference.
struct Scope {
    table: String,
    schema: Rc<RowSchema>,
}

/// A classified predicate operand.
enum Side {
    /// Column of the FROM table.
    Inner(usize),
    /// Column of the enclosing scope.
    Outer(usize),
    /// Literal.
    Const(Value),
}

pub(crate) fn build_template(
    select: &Select,
    catalog: &Catalog,
    outer: Option<&Scope>,
) -> Result<SubqueryTemplate> {
    let table = catalog.get(&select.table)?;
    let schema = table.borrow().schema();

    // Classify and type-check every predicate up front.
    let mut sides = Vec::with_capacity(select.wheres.len());
    for predicate in &select.wheres {
        let left = classify(&predicate.left, select, &schema, outer)?;
        let right = classify(&predicate.right, select, &schema, outer)?;
        check_comparable(predicate, select, &schema, outer, &left, &right)?;
        sides.push((left, right));
    }

    // Pick the source: the first equality predicate over an indexed column
    // wins; everything else filters.
    let mut source = SourceSpec::Scan;
    let mut filters = Vec::new();
    for (predicate, (left, right)) in select.wheres.iter().zip(sides) {
        if matches!(source, SourceSpec::Scan) && predicate.op == CmpOp::Eq {
            let keyed = match (&left, &right) {
                (Side::Inner(position), Side::Const(value)) => {
                    Some((*position, BoundValue::Literal(value.clone())))
                }
                (Side::Const(value), Side::Inner(position)) => {
                    Some((*position, BoundValue::Literal(value.clone())))
                }
                (Side::Inner(position), Side::Outer(outer_position)) => {
                    Some((*position, BoundValue::Outer(*outer_position)))
                }
                (Side::Outer(outer_position), Side::Inner(position)) => {
                    Some((*position, BoundValue::Outer(*outer_position)))
                }
                _ => None,
            };
            if let Some((position, key)) = keyed {
                if let Some(index) = table.borrow().index_for(position) {
                    source = SourceSpec::Lookup {
                        index,
                        column: position,
                        key,
                    };
                    continue;
                }
            }
        }
        filters.push(BoundPredicate {
            left: to_operand(left),
            op: predicate.op,
            right: to_operand(right),
        });
    }

    // Shape the select list into a projection, lowering nested selects into
    // child templates.
    let mut projection = Vec::new();
    let mut out_columns = Vec::new();
    let mut children = Vec::new();
    let mut child_columns = Vec::new();
    for selected in &select.selected {
        lower_selected(
            selected,
            select,
            catalog,
            &schema,
            outer,
            &mut projection,
            &mut out_columns,
            &mut children,
            &mut child_columns,
        )?;
    }

    let mid_schema = {
        let mut columns = schema.columns().to_vec();
        columns.extend(child_columns);
        Rc::new(RowSchema::new(columns))
    };

    // Every outer position the plan reads participates in its correlation
    // identity.
    let mut outer_refs = Vec::new();
    if let SourceSpec::Lookup {
        key: BoundValue::Outer(position),
        ..
    } = &source
    {
        outer_refs.push(*position);
    }
    for filter in &filters {
        for operand in [&filter.left, &filter.right] {
            if let BoundOperand::Value(BoundValue::Outer(position)) = operand {
                outer_refs.push(*position);
            }
        }
    }
    for column in &projection {
        if let ProjectedColumn::Value(BoundValue::Outer(position)) = column {
            outer_refs.push(*position);
        }
    }
    outer_refs.sort_unstable();
    outer_refs.dedup();

    Ok(SubqueryTemplate {
        table,
        source,
        filters,
        children,
        projection,
        outer_refs,
        mid_schema,
        schema: Rc::new(RowSchema::new(out_columns)),
    })
}

#[allow(clippy::too_many_arguments)]
fn lower_selected(
    selected: &SelectedValue,
    select: &Select,
    catalog: &Catalog,
    schema: &Rc<RowSchema>,
    outer: Option<&Scope>,
    projection: &mut Vec<ProjectedColumn>,
    out_columns: &mut Vec<Column>,
    children: &mut Vec<SubqueryTemplate>,
    child_columns: &mut Vec<Column>,
) -> Result<()> {
    match &selected.expr {
        Expr::Star => {
            if selected.alias.is_some() {
                return Err(Error::invalid_operation("'*' cannot carry an alias"));
            }
            for (position, column) in schema.columns().iter().enumerate() {
                projection.push(ProjectedColumn::Input(position));
                out_columns.push(Column::new(
                    format!("{}.{}", select.table, column.name()),
                    column.data_type(),
                ));
            }
        }
        Expr::TableAccess { table, column } => {
            let name = selected
                .alias
                .clone()
                .unwrap_or_else(|| format!("{}.{}", table, column));
            match classify(&selected.expr, select, schema, outer)? {
                Side::Inner(position) => {
                    let data_type = schema.get(position).expect("resolved position").data_type();
                    projection.push(ProjectedColumn::Input(position));
                    out_columns.push(Column::new(name, data_type));
                }
                Side::Outer(position) => {
                    let data_type = outer
                        .expect("outer side implies a scope")
                        .schema
                        .get(position)
                        .expect("resolved position")
                        .data_type();
                    projection.push(ProjectedColumn::Value(BoundValue::Outer(position)));
                    out_columns.push(Column::new(name, data_type));
                }
                Side::Const(_) => unreachable!("a table access never classifies as a literal"),
            }
        }
        Expr::Literal(value) => {
            let name = selected.alias.clone().unwrap_or_else(|| {
                value
                    .path_segment()
                    .expect("query literals are always scalar")
            });
            projection.push(ProjectedColumn::Value(BoundValue::Literal(value.clone())));
            out_columns.push(Column::new(name, value.data_type()));
        }
        Expr::Subquery(sub) => {
            let scope = Scope {
                table: select.table.clone(),
                schema: Rc::clone(schema),
            };
            let child = build_template(sub, catalog, Some(&scope))?;
            let name = selected.alias.clone().unwrap_or_else(|| sub.table.clone());
            projection.push(ProjectedColumn::Input(schema.len() + children.len()));
            out_columns.push(Column::new(name.clone(), DataType::Observable));
            child_columns.push(Column::new(name, DataType::Observable));
            children.push(child);
        }
    }
    Ok(())
}

fn classify(
    expr: &Expr,
    select: &Select,
    schema: &Rc<RowSchema>,
    outer: Option<&Scope>,
) -> Result<Side> {
    match expr {
        Expr::Literal(value) => Ok(Side::Const(value.clone())),
        Expr::TableAccess { table, column } => {
            if *table == select.table {
                let position = schema
                    .position(column)
                    .ok_or_else(|| Error::column_not_found(table, column))?;
                Ok(Side::Inner(position))
            } else if let Some(scope) = outer.filter(|scope| scope.table == *table) {
                let position = scope
                    .schema
                    .position(column)
                    .ok_or_else(|| Error::column_not_found(table, column))?;
                Ok(Side::Outer(position))
            } else {
                Err(Error::unbound_reference(table, column))
            }
        }
        Expr::Subquery(_) => Err(Error::invalid_operation(
            "subqueries are not allowed in WHERE",
        )),
        Expr::Star => Err(Error::invalid_operation("'*' is not allowed in WHERE")),
    }
}

fn side_type(side: &Side, schema: &RowSchema, outer: Option<&Scope>) -> DataType {
    match side {
        Side::Inner(position) => schema.get(*position).expect("resolved position").data_type(),
        Side::Outer(position) => outer
            .expect("outer side implies a scope")
            .schema
            .get(*position)
            .expect("resolved position")
            .data_type(),
        Side::Const(value) => value.data_type(),
    }
}

fn check_comparable(
    predicate: &WherePredicate,
    select: &Select,
    schema: &RowSchema,
    outer: Option<&Scope>,
    left: &Side,
    right: &Side,
) -> Result<()> {
    let left_type = side_type(left, schema, outer);
    let right_type = side_type(right, schema, outer);
    if left_type == right_type {
        return Ok(());
    }
    let (table, column) = match (&predicate.left, &predicate.right) {
        (Expr::TableAccess { table, column }, _) | (_, Expr::TableAccess { table, column }) => {
            (table.clone(), column.clone())
        }
        _ => (select.table.clone(), String::from("?")),
    };
    Err(Error::type_mismatch(table, column, left_type, right_type))
}

fn to_operand(side: Side) -> BoundOperand {
    match side {
        Side::Inner(position) => BoundOperand::Column(position),
        Side::Outer(position) => BoundOperand::Value(BoundValue::Outer(position)),
        Side::Const(value) => BoundOperand::Value(BoundValue::Literal(value)),
    }
}
