//! History Invariant Tests
//!
//! - Undo then redo of any command sequence restores the exact state
//! - Undo on an empty stack is an advisory no-op
//! - The undo stack is bounded by configuration
//! - A new edit clears the redo stack

use recordforge::engine::{Engine, EngineConfig};
use recordforge::history::Intent;
use recordforge::schema::FieldPath;
use serde_json::{json, Value};

fn engine(config: EngineConfig) -> Engine {
    let mut engine = Engine::with_config(config);
    engine
        .load_model(
            r#"{"__meta__": {
                "name": {"type": "str", "required": true},
                "scores": {"type": "list[list[int]]"},
                "contacts": {"type": "list[dict]", "fields": {"phone": {"type": "str"}}},
                "extra": {"type": "dict"}
            }}"#,
        )
        .unwrap();
    engine
        .load_data(vec![
            json!({"name": "Ana", "scores": [[1, 2]], "contacts": [{"phone": "1"}]}),
            json!({"name": "Rui", "legacy": true}),
            json!({"name": "Eva"}),
        ])
        .unwrap();
    engine
}

/// Runs a mixed command sequence and returns the number of undo steps.
fn run_sequence(engine: &mut Engine) -> usize {
    let ids = engine.store().ids();
    let root = FieldPath::root();

    let added = engine.add().unwrap();
    engine
        .set_field(added, &root.clone().key("name"), json!("New"))
        .unwrap();
    engine
        .set_field(ids[0], &root.clone().key("scores").index(0).append(), json!(3))
        .unwrap();
    engine
        .set_field(ids[0], &root.clone().key("contacts").index(0).key("phone"), json!(42))
        .unwrap();
    engine
        .set_field(ids[1], &root.clone().key("extra"), json!({"k": [1, {"z": null}]}))
        .unwrap();
    engine.remove(ids[1]).unwrap();
    engine
        .apply(Intent::Batch(vec![
            Intent::set_field(ids[2], root.clone().key("name"), Value::Null),
            Intent::RemoveRecord(ids[0]),
            Intent::AddRecord,
        ]))
        .unwrap();
    7
}

#[test]
fn test_undo_redo_are_exact_inverses() {
    let mut engine = engine(EngineConfig::default());
    let initial = engine.export_records();
    let initial_text = serde_json::to_string(&initial).unwrap();

    let steps = run_sequence(&mut engine);
    let after = serde_json::to_string(&engine.export_records()).unwrap();
    let after_ids = engine.store().ids();
    assert_eq!(engine.history().undo_depth(), steps);

    for _ in 0..steps {
        engine.undo().unwrap();
    }
    assert_eq!(serde_json::to_string(&engine.export_records()).unwrap(), initial_text);
    assert!(!engine.history().can_undo());

    for _ in 0..steps {
        engine.redo().unwrap();
    }
    assert_eq!(serde_json::to_string(&engine.export_records()).unwrap(), after);
    assert_eq!(engine.store().ids(), after_ids);
    assert!(!engine.history().can_redo());
}

#[test]
fn test_violations_follow_undo() {
    let mut engine = engine(EngineConfig::default());
    let id = engine.store().ids()[2];

    engine
        .set_field(id, &FieldPath::root().key("name"), Value::Null)
        .unwrap();
    assert_eq!(engine.violations(id).len(), 1);

    engine.undo().unwrap();
    assert!(engine.violations(id).is_empty());

    engine.redo().unwrap();
    assert_eq!(engine.violations(id).len(), 1);
}

#[test]
fn test_empty_stacks_are_advisory() {
    let mut engine = engine(EngineConfig::default());
    let before = engine.export_records();

    let err = engine.undo().unwrap_err();
    assert!(err.is_advisory());
    assert_eq!(err.code(), "HISTORY_EMPTY");
    assert!(engine.redo().unwrap_err().is_advisory());
    assert_eq!(engine.export_records(), before);
}

#[test]
fn test_depth_is_bounded_by_config() {
    let mut config = EngineConfig::default();
    config.history.max_depth = 3;
    let mut engine = engine(config);
    let id = engine.store().ids()[0];

    for i in 0..10 {
        engine
            .set_field(id, &FieldPath::root().key("name"), json!(format!("v{}", i)))
            .unwrap();
    }
    assert_eq!(engine.history().undo_depth(), 3);

    while engine.undo().is_ok() {}
    assert_eq!(
        engine.export_records()[0]["name"],
        json!("v6"),
        "only the last three edits are undoable"
    );
}

#[test]
fn test_new_edit_clears_redo() {
    let mut engine = engine(EngineConfig::default());
    let id = engine.store().ids()[0];

    engine.add().unwrap();
    engine.undo().unwrap();
    assert_eq!(engine.history().redo_depth(), 1);

    engine
        .set_field(id, &FieldPath::root().key("name"), json!("x"))
        .unwrap();
    assert_eq!(engine.history().redo_depth(), 0);
    assert!(engine.redo().unwrap_err().is_advisory());
}
