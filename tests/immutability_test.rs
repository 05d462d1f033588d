// The central correctness property of the tracer: frame snapshots are
// fully independent of later mutation, including nested structures.

use pretty_assertions::assert_eq;
use tracerun::context::EvaluationContext;
use tracerun::javascript::interpret;
use tracerun::value::Value;

fn run(source: &str) -> tracerun::InterpretResult {
    interpret(source, &EvaluationContext::default())
}

#[test]
fn test_flat_list_snapshot_survives_mutation() {
    let result = run(
        r#"
        let items = [1, 2, 3];
        items[0] = 99;
        "#,
    );
    assert!(result.success);

    assert_eq!(
        result.frames[0].variables["items"],
        Value::list(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    assert_eq!(
        result.frames[1].variables["items"],
        Value::list(vec![
            Value::Number(99.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
}

#[test]
fn test_nested_list_snapshot_survives_inner_mutation() {
    let result = run(
        r#"
        let inner = [1];
        let outer = [inner, 2];
        inner.push(99);
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());

    // The snapshot of `outer` taken before the push still holds the
    // single-element inner list.
    let outer_before = &result.frames[1].variables["outer"];
    assert_eq!(
        outer_before,
        &Value::list(vec![
            Value::list(vec![Value::Number(1.0)]),
            Value::Number(2.0)
        ])
    );

    // The live alias sees the mutation in the final frame.
    let outer_after = &result.frames[2].variables["outer"];
    assert_eq!(
        outer_after,
        &Value::list(vec![
            Value::list(vec![Value::Number(1.0), Value::Number(99.0)]),
            Value::Number(2.0)
        ])
    );
}

#[test]
fn test_dictionary_inside_list_snapshot_survives_mutation() {
    let result = run(
        r#"
        let config = {depth: 1};
        let stack = [config];
        config.depth = 99;
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());

    let stack_before = &result.frames[1].variables["stack"];
    let expected_before = Value::list(vec![Value::dict(
        [("depth".to_string(), Value::Number(1.0))].into_iter().collect(),
    )]);
    assert_eq!(stack_before, &expected_before);

    let stack_after = &result.frames[2].variables["stack"];
    let expected_after = Value::list(vec![Value::dict(
        [("depth".to_string(), Value::Number(99.0))].into_iter().collect(),
    )]);
    assert_eq!(stack_after, &expected_after);
}

#[test]
fn test_list_inside_dictionary_snapshot_survives_mutation() {
    let result = run(
        r#"
        let scores = [10];
        let player = {scores: scores};
        scores.push(20);
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());

    let player_before = &result.frames[1].variables["player"];
    let expected_before = Value::dict(
        [(
            "scores".to_string(),
            Value::list(vec![Value::Number(10.0)]),
        )]
        .into_iter()
        .collect(),
    );
    assert_eq!(player_before, &expected_before);
}

#[test]
fn test_every_intermediate_snapshot_is_stable_through_a_loop() {
    let result = run(
        r#"
        let items = [];
        for (let i = 0; i < 3; i++) {
            items.push(i);
        }
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());

    // Collect the length of `items` in each frame in which it appears;
    // re-reading the frames later must give the same answer (snapshots
    // never change after the run).
    let lengths: Vec<usize> = result
        .frames
        .iter()
        .filter_map(|f| match f.variables.get("items") {
            Some(Value::List(elements)) => Some(elements.borrow().len()),
            _ => None,
        })
        .collect();

    let lengths_again: Vec<usize> = result
        .frames
        .iter()
        .filter_map(|f| match f.variables.get("items") {
            Some(Value::List(elements)) => Some(elements.borrow().len()),
            _ => None,
        })
        .collect();

    assert_eq!(lengths, lengths_again);
    // The lengths must be non-decreasing through the run and reach 3.
    assert!(lengths.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*lengths.last().unwrap(), 3);
}

#[test]
fn test_result_values_are_snapshots_too() {
    let result = run(
        r#"
        let items = [1];
        items;
        items.push(2);
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());

    // Frame 1 evaluated `items`; its recorded result must still be the
    // one-element list even though the live list was pushed to afterwards.
    let recorded = result.frames[1].result.as_ref().unwrap();
    assert_eq!(recorded, &Value::list(vec![Value::Number(1.0)]));
}
