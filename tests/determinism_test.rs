// Determinism and compile-purity guarantees.

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;
use tracerun::context::{Arity, EvaluationContext, ExternalFunction};
use tracerun::error::RuntimeErrorKind;
use tracerun::value::Value;
use tracerun::{javascript, lesson, Language};

fn seeded(seed: u64) -> EvaluationContext {
    EvaluationContext {
        random_seed: Some(seed),
        ..EvaluationContext::default()
    }
}

#[test]
fn test_identical_seed_yields_identical_traces() {
    let source = "repeat 10 times do\n  log random_number(1, 100)\nend";

    let a = lesson::interpret(source, &seeded(1234));
    let b = lesson::interpret(source, &seeded(1234));

    let a_outputs: Vec<&str> = a.log_lines.iter().map(|l| l.output.as_str()).collect();
    let b_outputs: Vec<&str> = b.log_lines.iter().map(|l| l.output.as_str()).collect();
    assert_eq!(a_outputs, b_outputs);

    assert_eq!(a.frames.len(), b.frames.len());
    for (fa, fb) in a.frames.iter().zip(&b.frames) {
        assert_eq!(fa.time, fb.time);
        assert_eq!(fa.line, fb.line);
        assert_eq!(fa.status, fb.status);
        assert_eq!(fa.variables, fb.variables);
    }
}

#[test]
fn test_different_seeds_yield_different_sequences() {
    let source = "repeat 20 times do\n  log random_number(1, 1000000)\nend";

    let a = lesson::interpret(source, &seeded(1));
    let b = lesson::interpret(source, &seeded(2));

    let a_outputs: Vec<&str> = a.log_lines.iter().map(|l| l.output.as_str()).collect();
    let b_outputs: Vec<&str> = b.log_lines.iter().map(|l| l.output.as_str()).collect();
    assert_ne!(a_outputs, b_outputs);
}

#[test]
fn test_random_number_is_inclusive_on_both_bounds() {
    let mut seen_min = false;
    let mut seen_max = false;
    for seed in 0..200 {
        let result = lesson::interpret("log random_number(1, 3)", &seeded(seed));
        assert!(result.success);
        let n: f64 = result.log_lines[0].output.parse().unwrap();
        assert!((1.0..=3.0).contains(&n));
        seen_min |= n == 1.0;
        seen_max |= n == 3.0;
    }
    assert!(seen_min, "the minimum bound was never produced");
    assert!(seen_max, "the maximum bound was never produced");
}

#[test]
fn test_random_number_degenerate_range_returns_the_bound() {
    for seed in 0..20 {
        let result = lesson::interpret("log random_number(5, 5)", &seeded(seed));
        assert!(result.success);
        assert_eq!(result.log_lines[0].output, "5");
    }
}

#[test]
fn test_random_number_with_min_greater_than_max_is_logic_error() {
    let result = lesson::interpret("log random_number(10, 1)", &seeded(0));
    assert!(!result.success);
    let error = result.frames.last().unwrap().error.as_ref().unwrap();
    assert_eq!(error.kind, RuntimeErrorKind::LogicErrorInExecution);
}

#[test]
fn test_compile_never_invokes_external_functions() {
    let invocations = Rc::new(Cell::new(0u32));
    let counter = invocations.clone();
    let context = EvaluationContext {
        external_functions: vec![ExternalFunction::new(
            "sideEffect",
            "must never run during compile",
            Some(Arity::exactly(0)),
            move |_ctx, _args| {
                counter.set(counter.get() + 1);
                Ok(Value::None)
            },
        )],
        ..EvaluationContext::default()
    };

    let source = "sideEffect();\nlet x = random_number(1, 10);";
    let compile_result = javascript::compile(source, &context);
    assert!(compile_result.is_ok());
    assert_eq!(invocations.get(), 0);

    // The same source does invoke it when interpreted.
    let run_result = javascript::interpret(source, &context);
    assert!(run_result.success, "{:?}", run_result.frames.last());
    assert_eq!(invocations.get(), 1);
}

#[test]
fn test_compile_reports_syntax_errors() {
    let err = javascript::compile("let x = ;", &EvaluationContext::default()).unwrap_err();
    assert_eq!(
        err.kind,
        tracerun::error::SyntaxErrorKind::MissingExpression
    );
}

#[test]
fn test_concurrent_calls_do_not_cross_talk() {
    // Same seed, interleaved calls from multiple threads: every run must
    // still produce the identical trace, because no state is shared.
    let source = "repeat 5 times do\n  log random_number(1, 1000)\nend";
    let baseline = lesson::interpret(source, &seeded(77));
    let baseline_outputs: Vec<String> =
        baseline.log_lines.iter().map(|l| l.output.clone()).collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let source = source.to_string();
            let expected = baseline_outputs.clone();
            std::thread::spawn(move || {
                for _ in 0..10 {
                    let result = lesson::interpret(&source, &seeded(77));
                    let outputs: Vec<String> =
                        result.log_lines.iter().map(|l| l.output.clone()).collect();
                    assert_eq!(outputs, expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_trace_serializes_to_json() {
    let result = javascript::interpret(
        "let items = [1, \"two\", {a: true}]; console.log(items);",
        &EvaluationContext::default(),
    );
    assert!(result.success);
    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"sourceCode\"") || json.contains("\"source_code\""));
    assert!(json.contains("SUCCESS"));
}

#[test]
fn test_language_is_copy_into_threads() {
    // Compile is pure and Send-friendly data in, data out.
    let languages = [Language::Lesson, Language::JavaScript, Language::Python];
    for language in languages {
        let result = tracerun::compile(language, "", &EvaluationContext::default());
        assert!(result.is_ok());
    }
}
