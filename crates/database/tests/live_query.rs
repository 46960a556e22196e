//! End-to-end live query scenarios over the reference schema.

use rill_core::{Column, DataType, Observable, ObservableRef, Row, RowSchema, Value};
use rill_database::{Database, SyncKind, SyncMessage};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

const QUERY: &str = "SELECT person.name, person.email, person.age, person.id, (
  SELECT todo.title AS epic_title, person.name AS author, person.id
  FROM todo WHERE todo.person_id == person.id
) AS todos
FROM person WHERE person.age >= 3";

fn setup() -> Database {
    let mut db = Database::new();
    db.define_table(
        "person",
        vec![
            Column::new("name", DataType::String),
            Column::new("email", DataType::String),
            Column::new("age", DataType::Int),
            Column::new("id", DataType::Int),
        ],
    )
    .unwrap();
    db.define_table(
        "todo",
        vec![
            Column::new("title", DataType::String),
            Column::new("done", DataType::Bool),
            Column::new("person_id", DataType::Int),
        ],
    )
    .unwrap();
    db.index_on("todo", "person_id").unwrap();
    db.index_on("person", "age").unwrap();
    db
}

fn person(name: &str, age: i64, id: i64) -> Vec<Value> {
    vec![
        Value::from(name),
        Value::from("email@gmail.com"),
        Value::Int(age),
        Value::Int(id),
    ]
}

fn todo(title: &str, person_id: i64) -> Vec<Value> {
    vec![Value::from(title), Value::Bool(false), Value::Int(person_id)]
}

type Messages = Rc<RefCell<Vec<SyncMessage>>>;

fn collect() -> (Messages, impl Fn(&SyncMessage) + 'static) {
    let messages: Messages = Rc::new(RefCell::new(Vec::new()));
    let sink = messages.clone();
    (messages, move |m: &SyncMessage| {
        sink.borrow_mut().push(m.clone())
    })
}

#[test]
fn base_add_emits_patch_with_empty_todos() {
    let db = setup();
    let (messages, sink) = collect();
    let (_live, _emitter) = db.observe(QUERY, sink).unwrap();

    db.insert("person", person("shmuli", 22, 0)).unwrap();

    let messages = messages.borrow();
    assert_eq!(messages[0].kind, SyncKind::Initial);
    let add = &messages[1];
    assert_eq!(add.kind, SyncKind::Add);
    assert_eq!(add.path, "/shmuli");
    assert_eq!(
        add.data,
        "{\"person.name\":\"shmuli\",\"person.email\":\"email@gmail.com\",\
         \"person.age\":22,\"person.id\":0,\"todos\":[]}"
    );
}

#[test]
fn correlated_add_emits_nested_patch() {
    let db = setup();
    let (messages, sink) = collect();
    let (_live, _emitter) = db.observe(QUERY, sink).unwrap();

    db.insert("person", person("shmuli", 22, 0)).unwrap();
    db.insert("todo", todo("eat food", 0)).unwrap();

    let messages = messages.borrow();
    let nested = messages.last().unwrap();
    assert_eq!(nested.kind, SyncKind::Add);
    assert_eq!(nested.path, "/shmuli/todos/eat food");
    assert_eq!(
        nested.data,
        "{\"epic_title\":\"eat food\",\"author\":\"shmuli\",\"person.id\":0}"
    );
}

#[test]
fn filtered_out_row_enters_result_on_update() {
    let db = setup();
    let (messages, sink) = collect();
    let (_live, _emitter) = db.observe(QUERY, sink).unwrap();

    db.insert("person", person("kid", 2, 1)).unwrap();
    assert_eq!(messages.borrow().len(), 1); // only the initial snapshot

    db.update_where_eq("person", "id", &Value::Int(1), person("kid", 4, 1))
        .unwrap();

    let messages = messages.borrow();
    let entered = messages.last().unwrap();
    // The row newly enters the result set, so the patch is an add.
    assert_eq!(entered.kind, SyncKind::Add);
    assert_eq!(entered.path, "/kid");
}

#[test]
fn delete_cascade_tears_down_nested_todos() {
    let db = setup();
    let (messages, sink) = collect();
    let (_live, _emitter) = db.observe(QUERY, sink).unwrap();

    db.insert("person", person("shmuli", 22, 0)).unwrap();
    db.insert("todo", todo("eat food", 0)).unwrap();

    db.remove_where_eq("person", "id", &Value::Int(0)).unwrap();
    assert_eq!(messages.borrow().last().unwrap().kind, SyncKind::Remove);
    assert_eq!(messages.borrow().last().unwrap().path, "/shmuli");

    // The torn-down subtree no longer produces events.
    let count_before = messages.borrow().len();
    db.insert("todo", todo("late todo", 0)).unwrap();
    assert_eq!(messages.borrow().len(), count_before);
}

#[test]
fn sum_aggregate_over_persons() {
    let db = setup();
    let table = db.table("person").unwrap();
    let age_position = table.borrow().schema().position("age").unwrap();

    let sum = Rc::new(RefCell::new(rill_reactive::Sum::new(age_position)));
    let seen: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();
    sum.borrow_mut()
        .subscribe(move |v| seen_clone.borrow_mut().push(*v));

    let obs: ObservableRef = table.clone();
    let sub: rill_core::SubscriberRef = sum.clone();
    rill_core::link(&obs, &sub);

    db.insert("person", person("a", 22, 0)).unwrap();
    db.insert("person", person("b", 22, 1)).unwrap();
    db.insert("person", person("c", 20, 2)).unwrap();
    db.remove_where_eq("person", "id", &Value::Int(1)).unwrap();

    assert_eq!(*seen.borrow(), vec![22, 44, 64, 42]);
}

#[test]
fn index_probe_returns_ids_in_insertion_order() {
    let db = setup();
    let index = db.index_on("todo", "person_id").unwrap();

    db.insert("todo", todo("eat food", 0)).unwrap();
    db.insert("todo", todo("play music", 1)).unwrap();
    db.insert("todo", todo("clean", 0)).unwrap();

    assert_eq!(index.borrow().probe(&Value::Int(0)), vec![0, 2]);
    assert_eq!(index.borrow().probe(&Value::Int(1)), vec![1]);
    assert!(index.borrow().probe(&Value::Int(9)).is_empty());
}

/// Walks the current result recursively, collecting every row path.
fn walk_paths(rows: &[Row], schema: &RowSchema, base: &str, out: &mut BTreeSet<String>) {
    for row in rows {
        let pk = row.get(0).unwrap().path_segment().unwrap();
        let row_path = format!("{}/{}", base, pk);
        assert!(
            out.insert(row_path.clone()),
            "duplicate live path {}",
            row_path
        );
        for (position, value) in row.values().iter().enumerate() {
            if let Value::Observable(child) = value {
                let column = schema.get(position).unwrap().name().to_string();
                let child_schema = child.borrow().row_schema();
                let child_rows = child.borrow_mut().snapshot();
                walk_paths(
                    &child_rows,
                    &child_schema,
                    &format!("{}/{}", row_path, column),
                    out,
                );
            }
        }
    }
}

/// Applies a patch stream to a path-keyed model of the client state.
fn apply(messages: &[SyncMessage]) -> BTreeMap<String, String> {
    let mut state = BTreeMap::new();
    for message in messages {
        match message.kind {
            SyncKind::Initial => {}
            SyncKind::Add | SyncKind::Update => {
                state.insert(message.path.clone(), message.data.clone());
            }
            SyncKind::Remove => {
                let prefix = format!("{}/", message.path);
                state.retain(|path, _| path != &message.path && !path.starts_with(&prefix));
            }
        }
    }
    state
}

#[test]
fn patch_stream_converges_to_fresh_walk() {
    let db = setup();
    let (messages, sink) = collect();
    let (live, _emitter) = db.observe(QUERY, sink).unwrap();

    db.insert("person", person("shmuli", 22, 0)).unwrap();
    db.insert("person", person("ajay", 22, 1)).unwrap();
    db.insert("person", person("the-doo-er", 20, 2)).unwrap();
    db.insert("person", person("kid", 2, 3)).unwrap();

    db.insert("todo", todo("eat food", 0)).unwrap();
    db.insert("todo", todo("play music", 0)).unwrap();
    db.insert("todo", todo("clean", 1)).unwrap();
    db.insert("todo", todo("do art", 2)).unwrap();
    db.insert("todo", todo("invisible", 3)).unwrap();

    db.remove_where_eq("person", "id", &Value::Int(1)).unwrap();
    db.remove_where_eq("todo", "title", &Value::from("play music"))
        .unwrap();
    db.update_where_eq("person", "id", &Value::Int(2), person("the-doo-er", 21, 2))
        .unwrap();

    let state = apply(&messages.borrow());

    let mut expected = BTreeSet::new();
    let schema = live.schema();
    walk_paths(&live.snapshot(), &schema, "", &mut expected);

    let got: BTreeSet<String> = state.keys().cloned().collect();
    assert_eq!(got, expected);

    // Spot-check a payload survived the update.
    assert!(state.get("/the-doo-er").unwrap().contains("\"person.age\":21"));
}

#[test]
fn reference_scenario_full_flow() {
    let db = setup();
    let live = db.query(QUERY).unwrap();

    db.insert("person", person("shmuli", 22, 0)).unwrap();
    db.insert("todo", todo("eat food", 0)).unwrap();
    db.insert("todo", todo("clean", 0)).unwrap();

    let rows = live.snapshot();
    assert_eq!(rows.len(), 1);

    let schema = live.schema();
    assert_eq!(schema.get(0).unwrap().name(), "person.name");
    assert_eq!(schema.get(4).unwrap().name(), "todos");
    assert_eq!(schema.get(4).unwrap().data_type(), DataType::Observable);

    let nested = rows[0].get(4).unwrap().as_observable().unwrap().clone();
    let titles: Vec<String> = nested
        .borrow_mut()
        .snapshot()
        .iter()
        .map(|row| row.get(0).unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["eat food", "clean"]);
}
