// External function bridge: injection, the execution-control handle, and
// the repeat-forever completion protocol.

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use tracerun::context::{Arity, EvaluationContext, ExternalFunction};
use tracerun::error::RuntimeErrorKind;
use tracerun::lesson;
use tracerun::value::Value;

fn echo_context(echos: Rc<RefCell<Vec<String>>>) -> EvaluationContext {
    EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "echo",
            "records its argument",
            Some(Arity::exactly(1)),
            move |_ctx, args| {
                echos.borrow_mut().push(args[0].format(tracerun::Language::Lesson));
                Ok(Value::None)
            },
        )],
        ..EvaluationContext::default()
    }
}

#[test]
fn test_external_function_receives_arguments() {
    let echos = Rc::new(RefCell::new(Vec::new()));
    let context = echo_context(echos.clone());

    let result = lesson::interpret("echo(1)\necho(\"two\")", &context);
    assert!(result.success);
    assert_eq!(*echos.borrow(), vec!["1".to_string(), "two".to_string()]);
}

#[test]
fn test_external_function_return_value_flows_back() {
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "get_answer",
            "returns the answer",
            Some(Arity::exactly(0)),
            |_ctx, _args| Ok(Value::Number(42.0)),
        )],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret("set x to get_answer()", &context);
    assert!(result.success);
    assert_eq!(result.frames[0].variables["x"], Value::Number(42.0));
}

#[test]
fn test_unknown_function_is_an_error_frame() {
    let result = lesson::interpret("nonexistent()", &EvaluationContext::default());
    assert!(!result.success);
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::FunctionNotFound);
}

#[test]
fn test_arity_mismatch_is_an_error_frame() {
    let echos = Rc::new(RefCell::new(Vec::new()));
    let context = echo_context(echos);

    let result = lesson::interpret("echo(1, 2)", &context);
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::InvalidNumberOfArguments);
}

#[test]
fn test_logic_error_channel() {
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "move_off_board",
            "always complains",
            None,
            |ctx, _args| Err(ctx.logic_error("you moved off the board")),
        )],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret("move_off_board()", &context);
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::LogicErrorInExecution);
    assert_eq!(error.message, "you moved off the board");
}

#[test]
fn test_fast_forward_advances_logical_time() {
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "advance_time",
            "fast-forwards",
            Some(Arity::exactly(1)),
            |ctx, args| {
                let n = args[0].as_number().unwrap_or(0.0) as u64;
                ctx.fast_forward(n);
                Ok(Value::None)
            },
        )],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret("log 1\nadvance_time(5)\nlog 2", &context);
    assert!(result.success);
    assert_eq!(result.frames[0].time, 0);
    assert_eq!(result.frames[1].time, 5001);
    assert_eq!(result.frames[2].time, 5002);
}

#[test]
fn test_completion_signal_stops_repeat_forever() {
    let calls = Rc::new(RefCell::new(0u32));
    let calls_in_fn = calls.clone();
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "step",
            "finishes the exercise on the third call",
            Some(Arity::exactly(0)),
            move |ctx, _args| {
                *calls_in_fn.borrow_mut() += 1;
                if *calls_in_fn.borrow() == 3 {
                    ctx.finish();
                }
                Ok(Value::None)
            },
        )],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret("repeat_forever do\n  step()\nend", &context);
    assert!(result.success, "{:?}", result.frames.last());
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_completion_signal_lets_in_progress_iteration_finish() {
    // The signal is raised by the FIRST statement of the iteration; the
    // second statement must still run before the loop stops.
    let after = Rc::new(RefCell::new(0u32));
    let after_in_fn = after.clone();
    let context = EvaluationContext {
        external_functions: vec![
            ExternalFunction::new(
                "finish_now",
                "raises the completion signal",
                Some(Arity::exactly(0)),
                |ctx, _args| {
                    ctx.finish();
                    Ok(Value::None)
                },
            ),
            ExternalFunction::new(
                "after_signal",
                "counts calls made after the signal",
                Some(Arity::exactly(0)),
                move |_ctx, _args| {
                    *after_in_fn.borrow_mut() += 1;
                    Ok(Value::None)
                },
            ),
        ],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret(
        "repeat_forever do\n  finish_now()\n  after_signal()\nend",
        &context,
    );
    assert!(result.success, "{:?}", result.frames.last());
    // Exactly one iteration ran, and its second statement did execute.
    assert_eq!(*after.borrow(), 1);
}

#[test]
fn test_external_log_lines_are_recorded() {
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "announce",
            "logs through the handle",
            Some(Arity::exactly(0)),
            |ctx, _args| {
                ctx.log("from the host");
                Ok(Value::None)
            },
        )],
        ..EvaluationContext::default()
    };

    let result = lesson::interpret("announce()", &context);
    assert!(result.success);
    assert_eq!(result.log_lines.len(), 1);
    assert_eq!(result.log_lines[0].output, "from the host");
}

#[test]
fn test_external_functions_work_from_javascript_too() {
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "add",
            "adds two numbers",
            Some(Arity::exactly(2)),
            |_ctx, args| {
                let a = args[0].as_number().unwrap_or(0.0);
                let b = args[1].as_number().unwrap_or(0.0);
                Ok(Value::Number(a + b))
            },
        )],
        ..EvaluationContext::default()
    };

    let result = tracerun::javascript::interpret("let x = add(3, 5);", &context);
    assert!(result.success);
    assert_eq!(result.frames[0].variables["x"], Value::Number(8.0));
}
