// Behavioral tests for the lesson front-end.

use pretty_assertions::assert_eq;
use tracerun::context::EvaluationContext;
use tracerun::error::{RuntimeErrorKind, SyntaxErrorKind};
use tracerun::frame::FrameStatus;
use tracerun::lesson::{evaluate_function, interpret};
use tracerun::value::Value;

fn run(source: &str) -> tracerun::InterpretResult {
    interpret(source, &EvaluationContext::default())
}

#[test]
fn test_set_yields_one_frame() {
    let result = run("set x to 42");
    assert!(result.error.is_none());
    assert_eq!(result.frames.len(), 1);
    assert_eq!(result.frames[0].status, FrameStatus::Success);
    assert_eq!(result.frames[0].variables["x"], Value::Number(42.0));
}

#[test]
fn test_set_string() {
    let result = run("set x to \"hello there\"");
    assert_eq!(result.frames[0].variables["x"], Value::string("hello there"));
}

#[test]
fn test_change_updates_variable() {
    let result = run("set pos to 10\nchange pos to pos + 5");
    assert!(result.success);
    assert_eq!(result.frames.len(), 2);
    assert_eq!(result.frames[1].variables["pos"], Value::Number(15.0));
}

#[test]
fn test_change_undeclared_variable_errors() {
    let result = run("change pos to 10");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::VariableNotDeclared);
}

#[test]
fn test_set_twice_errors() {
    let result = run("set x to 1\nset x to 2");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::VariableAlreadyDeclared);
}

#[test]
fn test_repeat_frame_shape() {
    // One frame for the set, then one iteration frame plus one body frame
    // per pass through the loop.
    let result = run("set pos to 10\nrepeat 5 times do\n  change pos to pos + 10\nend");
    assert!(result.success);
    assert_eq!(result.frames.len(), 11);
    assert_eq!(
        result.frames.last().unwrap().variables["pos"],
        Value::Number(60.0)
    );
}

#[test]
fn test_variable_persists_after_repeat() {
    let result = run(
        "set pos to 10\nrepeat 5 times do\n  change pos to pos + 10\nend\nchange pos to pos + 10",
    );
    assert_eq!(result.frames.len(), 12);
    assert_eq!(
        result.frames.last().unwrap().variables["pos"],
        Value::Number(70.0)
    );
}

#[test]
fn test_if_frame_shape() {
    let result = run(
        "set pos to 10\nif pos is 10 do\n  change pos to pos + 10\nend\nchange pos to pos + 5",
    );
    assert_eq!(result.frames.len(), 4);
    assert_eq!(
        result.frames.last().unwrap().variables["pos"],
        Value::Number(25.0)
    );
}

#[test]
fn test_condition_must_be_boolean() {
    let result = run("if 1 do\nend");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::TypeError);
}

#[test]
fn test_log_records_output() {
    let result = run("log \"foobar\"");
    assert_eq!(result.frames.len(), 1);
    assert_eq!(result.log_lines.len(), 1);
    assert_eq!(result.log_lines[0].output, "foobar");
    assert_eq!(
        result.frames[0].result.as_ref().unwrap(),
        &Value::string("foobar")
    );
}

#[test]
fn test_lists_are_one_indexed() {
    let result = run("set items to [10, 20, 30]\nlog items[1]");
    assert!(result.success);
    assert_eq!(result.log_lines[0].output, "10");
}

#[test]
fn test_index_zero_is_out_of_bounds() {
    let result = run("set items to [10, 20, 30]\nlog items[0]");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::IndexOutOfBounds);
}

#[test]
fn test_change_list_element() {
    let result = run("set items to [1, 2, 3]\nchange items[2] to 99");
    assert!(result.success);
    let last = result.frames.last().unwrap();
    assert_eq!(
        last.variables["items"],
        Value::list(vec![
            Value::Number(1.0),
            Value::Number(99.0),
            Value::Number(3.0)
        ])
    );
}

#[test]
fn test_string_indexing() {
    let result = run("log \"foobar\"[4]");
    assert!(result.success);
    assert_eq!(result.log_lines[0].output, "b");
}

#[test]
fn test_foreach_over_string() {
    let result = run("set out to \"\"\nfor each char in \"ab\" do\n  change out to concatenate(out, char)\nend");
    assert!(result.success, "{:?}", result.frames.last());
    assert_eq!(
        result.frames.last().unwrap().variables["out"],
        Value::string("ab")
    );
}

#[test]
fn test_foreach_dictionary_needs_two_names() {
    let result = run("set d to {\"a\": 1}\nfor each k in d do\nend");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::TypeError);
}

#[test]
fn test_foreach_dictionary_binds_key_and_value() {
    let result = run(
        "set d to {\"a\": 1, \"b\": 2}\nset total to 0\nfor each k, v in d do\n  change total to total + v\nend",
    );
    assert!(result.success, "{:?}", result.frames.last());
    assert_eq!(
        result.frames.last().unwrap().variables["total"],
        Value::Number(3.0)
    );
}

#[test]
fn test_functions_are_pass_by_value_in_frames() {
    // Mutating a list inside a function must not leak into snapshots
    // taken before the call... but the live list itself is shared, which
    // is exactly what the learner observes afterwards.
    let result = run(
        "set original to [1, 2, 3]\nfunction bump with list do\n  change list[1] to 99\nend\nbump(original)",
    );
    assert!(result.success, "{:?}", result.frames.last());

    // The first frame's snapshot still holds the pre-mutation list.
    assert_eq!(
        result.frames[0].variables["original"],
        Value::list(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    // The final frame sees the mutation through the alias.
    assert_eq!(
        result.frames.last().unwrap().variables["original"],
        Value::list(vec![
            Value::Number(99.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
}

#[test]
fn test_function_return_value() {
    let result = run("function double with x do\n  return x * 2\nend\nset y to double(21)");
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["y"],
        Value::Number(42.0)
    );
}

#[test]
fn test_return_outside_function_is_error_frame() {
    let result = run("return 1");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::UnexpectedReturnOutsideFunction);
}

#[test]
fn test_missing_end_is_syntax_error() {
    let result = run("repeat 3 times do\n  log 1");
    assert_eq!(result.error.unwrap().kind, SyntaxErrorKind::MissingEndKeyword);
    assert_eq!(result.frames.len(), 0);
}

#[test]
fn test_stdlib_functions() {
    let result = run("set s to to_upper_case(concatenate(\"hello\", \" world\"))");
    assert!(result.success);
    assert_eq!(
        result.frames[0].variables["s"],
        Value::string("HELLO WORLD")
    );
}

#[test]
fn test_stdlib_function_gating() {
    let context = EvaluationContext {
        language_features: tracerun::context::LanguageFeatures {
            allowed_stdlib_functions: Some(vec!["concatenate".to_string()]),
            ..Default::default()
        },
        ..EvaluationContext::default()
    };
    let allowed = interpret("set s to concatenate(\"a\", \"b\")", &context);
    assert!(allowed.success);

    let restricted = interpret("set s to to_upper_case(\"a\")", &context);
    let error = restricted.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::MethodNotYetAvailable);
}

#[test]
fn test_repeat_forever_hits_ceiling_without_signal() {
    let result = run("repeat_forever do\nend");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::MaxIterationsReached);
}

#[test]
fn test_evaluate_function_invokes_named_function() {
    let source = "function double with x do\n  return x * 2\nend";
    let outcome = evaluate_function(
        source,
        &EvaluationContext::default(),
        "double",
        &[Value::Number(21.0)],
    );
    assert_eq!(outcome.value, Some(Value::Number(42.0)));
    assert!(outcome.result.success);
}

#[test]
fn test_evaluate_function_missing_function() {
    let outcome = evaluate_function(
        "set x to 1",
        &EvaluationContext::default(),
        "missing",
        &[],
    );
    assert_eq!(outcome.value, None);
    let error = outcome.result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::FunctionNotFound);
}

#[test]
fn test_frame_descriptions_are_generated_on_demand() {
    let result = run("set x to 42");
    assert_eq!(
        result.frames[0].description(),
        "Declared the variable `x` and set it to `42`."
    );
}
