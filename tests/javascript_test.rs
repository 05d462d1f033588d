// Behavioral tests for the JavaScript front-end.

use pretty_assertions::assert_eq;
use tracerun::context::{EvaluationContext, LanguageFeatures, StdlibAllowList};
use tracerun::error::{RuntimeErrorKind, SyntaxErrorKind};
use tracerun::frame::FrameStatus;
use tracerun::javascript::interpret;
use tracerun::value::Value;

fn run(source: &str) -> tracerun::InterpretResult {
    interpret(source, &EvaluationContext::default())
}

#[test]
fn test_single_declaration_yields_one_frame() {
    let result = run("let x = 42;");
    assert!(result.error.is_none());
    assert_eq!(result.frames.len(), 1);
    assert_eq!(result.frames[0].status, FrameStatus::Success);
    assert_eq!(result.frames[0].variables["x"], Value::Number(42.0));
}

#[test]
fn test_declaration_with_expression() {
    let result = run("let result = 5 + 3;");
    assert_eq!(result.frames[0].variables["result"], Value::Number(8.0));
}

#[test]
fn test_variable_access_frames() {
    let result = run("let x = 10; x;");
    assert_eq!(result.frames.len(), 2);
    assert_eq!(
        result.frames[1].result.as_ref().unwrap(),
        &Value::Number(10.0)
    );
}

#[test]
fn test_accessing_undeclared_variable() {
    let result = run("x;");
    assert!(result.error.is_none());
    assert!(!result.success);
    let error_frame = result.frames.last().unwrap();
    assert_eq!(error_frame.status, FrameStatus::Error);
    assert_eq!(
        error_frame.error.as_ref().unwrap().kind,
        RuntimeErrorKind::VariableNotDeclared
    );
}

#[test]
fn test_using_variable_in_its_own_declaration() {
    let result = run("let x = x + 1;");
    let error_frame = result.frames.last().unwrap();
    assert_eq!(
        error_frame.error.as_ref().unwrap().kind,
        RuntimeErrorKind::VariableNotDeclared
    );
}

#[test]
fn test_const_in_for_loop_init_is_a_parse_error_with_zero_frames() {
    let result = run("for (const i = 0; i < 5; i++) {}");
    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, SyntaxErrorKind::ConstInForLoopInit);
    assert_eq!(result.frames.len(), 0);
}

#[test]
fn test_const_cannot_be_reassigned() {
    let result = run("const x = 1; x = 2;");
    let error_frame = result.frames.last().unwrap();
    assert_eq!(
        error_frame.error.as_ref().unwrap().kind,
        RuntimeErrorKind::AssignmentToConstant
    );
}

#[test]
fn test_for_in_over_array_is_a_runtime_error() {
    let result = run("for (let k in [1, 2, 3]) {}");
    assert!(result.error.is_none());
    assert!(!result.success);
    let error_frame = result.frames.last().unwrap();
    assert_eq!(error_frame.status, FrameStatus::Error);
    assert_eq!(
        error_frame.error.as_ref().unwrap().kind,
        RuntimeErrorKind::ForInTargetNotDictionary
    );
}

#[test]
fn test_for_in_over_number_is_a_runtime_error() {
    let result = run("for (let k in 42) {}");
    assert_eq!(
        result.frames.last().unwrap().error.as_ref().unwrap().kind,
        RuntimeErrorKind::ForInTargetNotDictionary
    );
}

#[test]
fn test_for_in_iterates_dictionary_keys() {
    let result = run(
        r#"
        let d = {a: 1, b: 2};
        let keys = [];
        for (let k in d) {
            keys.push(k);
        }
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());
    let last = result.frames.last().unwrap();
    assert_eq!(
        last.variables["keys"],
        Value::list(vec![Value::string("a"), Value::string("b")])
    );
}

#[test]
fn test_for_of_iterates_array_values() {
    let result = run(
        r#"
        let total = 0;
        for (const n of [1, 2, 3]) {
            total += n;
        }
        "#,
    );
    assert!(result.success);
    let last = result.frames.last().unwrap();
    assert_eq!(last.variables["total"], Value::Number(6.0));
}

#[test]
fn test_while_loop_runs_to_completion() {
    let result = run(
        r#"
        let i = 0;
        while (i < 3) {
            i++;
        }
        "#,
    );
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["i"],
        Value::Number(3.0)
    );
}

#[test]
fn test_repeat_loop() {
    let result = run(
        r#"
        let count = 0;
        repeat (5) {
            count = count + 1;
        }
        "#,
    );
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["count"],
        Value::Number(5.0)
    );
}

#[test]
fn test_break_exits_loop_early() {
    let result = run(
        r#"
        let count = 0;
        while (true) {
            count = count + 1;
            if (count === 3) {
                break;
            }
        }
        "#,
    );
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["count"],
        Value::Number(3.0)
    );
}

#[test]
fn test_continue_in_c_style_for_still_runs_update() {
    let result = run(
        r#"
        let evens = [];
        for (let i = 0; i < 6; i++) {
            if (i % 2 === 1) {
                continue;
            }
            evens.push(i);
        }
        "#,
    );
    assert!(result.success, "{:?}", result.frames.last());
    let last = result.frames.last().unwrap();
    assert_eq!(
        last.variables["evens"],
        Value::list(vec![
            Value::Number(0.0),
            Value::Number(2.0),
            Value::Number(4.0)
        ])
    );
}

#[test]
fn test_break_outside_loop_is_an_error_frame() {
    let result = run("break;");
    assert!(result.error.is_none());
    let error_frame = result.frames.last().unwrap();
    assert_eq!(error_frame.status, FrameStatus::Error);
    assert_eq!(
        error_frame.error.as_ref().unwrap().kind,
        RuntimeErrorKind::UnexpectedBreakOutsideLoop
    );
}

#[test]
fn test_continue_outside_loop_is_an_error_frame() {
    let result = run("continue;");
    assert_eq!(
        result.frames.last().unwrap().error.as_ref().unwrap().kind,
        RuntimeErrorKind::UnexpectedContinueOutsideLoop
    );
}

#[test]
fn test_no_frames_after_an_error_frame() {
    let result = run("let a = 1; b; let c = 2;");
    let error_index = result
        .frames
        .iter()
        .position(|f| f.status == FrameStatus::Error)
        .unwrap();
    assert_eq!(error_index, result.frames.len() - 1);
}

#[test]
fn test_frame_times_strictly_increase() {
    let result = run(
        r#"
        let x = 1;
        let y = 2;
        for (let i = 0; i < 3; i++) {
            x = x + y;
        }
        "#,
    );
    let times: Vec<u64> = result.frames.iter().map(|f| f.time).collect();
    for pair in times.windows(2) {
        assert!(pair[0] < pair[1], "times not increasing: {:?}", times);
    }
}

#[test]
fn test_functions_declare_and_call() {
    let result = run(
        r#"
        function add(a, b) {
            return a + b;
        }
        let result = add(3, 4);
        "#,
    );
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["result"],
        Value::Number(7.0)
    );
}

#[test]
fn test_function_wrong_arity() {
    let result = run(
        r#"
        function add(a, b) {
            return a + b;
        }
        add(1);
        "#,
    );
    assert_eq!(
        result.frames.last().unwrap().error.as_ref().unwrap().kind,
        RuntimeErrorKind::InvalidNumberOfArguments
    );
}

#[test]
fn test_console_log_appends_log_lines() {
    let result = run("console.log(\"hello\"); console.log(42);");
    assert!(result.success);
    let outputs: Vec<&str> = result.log_lines.iter().map(|l| l.output.as_str()).collect();
    assert_eq!(outputs, vec!["hello", "42"]);
}

#[test]
fn test_string_methods() {
    let result = run("let shout = \"hello\".toUpperCase();");
    assert_eq!(
        result.frames[0].variables["shout"],
        Value::string("HELLO")
    );
}

#[test]
fn test_string_length_property() {
    let result = run("let n = \"hello\".length;");
    assert_eq!(result.frames[0].variables["n"], Value::Number(5.0));
}

#[test]
fn test_unknown_member_is_property_not_found() {
    let result = run("let arr = [1]; arr.shuffle();");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::PropertyNotFound);
}

#[test]
fn test_restricted_member_is_method_not_yet_available() {
    let features = LanguageFeatures {
        allowed_stdlib: Some(StdlibAllowList::default().allow("array", &["length"], &[])),
        ..LanguageFeatures::default()
    };
    let context = EvaluationContext {
        language_features: features,
        ..EvaluationContext::default()
    };
    let result = interpret("let arr = [1, 2, 3]; arr.at(0);", &context);
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::MethodNotYetAvailable);
    assert_eq!(error.context.get("method").map(String::as_str), Some("at"));
}

#[test]
fn test_allowed_member_still_works_under_allow_list() {
    let features = LanguageFeatures {
        allowed_stdlib: Some(StdlibAllowList::default().allow("array", &["length"], &["at"])),
        ..LanguageFeatures::default()
    };
    let context = EvaluationContext {
        language_features: features,
        ..EvaluationContext::default()
    };
    let result = interpret("let arr = [5, 6]; let x = arr.at(1);", &context);
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["x"],
        Value::Number(6.0)
    );
}

#[test]
fn test_computed_access_to_stdlib_member_is_type_error() {
    let result = run("let arr = [1, 2, 3]; arr[\"length\"];");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::TypeError);
}

#[test]
fn test_out_of_bounds_index() {
    let result = run("let arr = [1, 2, 3]; arr[5];");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::IndexOutOfBounds);
}

#[test]
fn test_object_property_read_and_write() {
    let result = run(
        r#"
        let person = {name: "Ada"};
        person.name = "Grace";
        let name = person.name;
        "#,
    );
    assert!(result.success);
    assert_eq!(
        result.frames.last().unwrap().variables["name"],
        Value::string("Grace")
    );
}

#[test]
fn test_missing_object_property_reads_as_null() {
    let result = run("let d = {a: 1}; let v = d.missing;");
    assert!(result.success);
    assert_eq!(result.frames.last().unwrap().variables["v"], Value::None);
}

#[test]
fn test_meta_source_code_round_trips() {
    let source = "let x = 42;";
    let result = run(source);
    assert_eq!(result.meta.source_code, source);

    let failing = "let x = ;";
    let result = run(failing);
    assert!(!result.success);
    assert_eq!(result.meta.source_code, failing);
}

#[test]
fn test_require_semicolons_mode() {
    let features = LanguageFeatures {
        require_semicolons: true,
        ..LanguageFeatures::default()
    };
    let context = EvaluationContext {
        language_features: features,
        ..EvaluationContext::default()
    };
    let result = interpret("let x = 1", &context);
    assert_eq!(
        result.error.unwrap().kind,
        SyntaxErrorKind::MissingSemicolon
    );
}

#[test]
fn test_infinite_loop_hits_iteration_ceiling() {
    let result = run("while (true) {}");
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::MaxIterationsReached);
}

#[test]
fn test_error_frame_line_matches_failing_statement() {
    let result = run("let a = 1;\nlet b = 2;\nboom();");
    let error_frame = result.frames.last().unwrap();
    assert_eq!(error_frame.line, 3);
}
