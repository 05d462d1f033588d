//! Free stdlib functions.
//!
//! These are the functions a program can call without a receiver:
//! the lesson language's whole library surface (`concatenate`,
//! `to_upper_case`, `random_number`, …) plus the Python builtins
//! (`len`, `str`, `abs`). Availability is gated per call by
//! `allowed_stdlib_functions`; the gate itself lives in the interpreter
//! so that user-defined and external functions are resolved first.

use super::{guard_exact_args, guard_number_arg, guard_string_arg};
use crate::ast::SourceLocation;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::rng::Prng;
use crate::value::{format_number, Value};
use crate::Language;

const SHARED: &[&str] = &[
    "concatenate",
    "join",
    "to_upper_case",
    "to_lower_case",
    "number_to_string",
    "string_to_number",
    "min",
    "max",
    "length",
    "index_of",
    "random_number",
];

const PYTHON_BUILTINS: &[&str] = &["len", "str", "abs"];

pub fn is_stdlib_function(language: Language, name: &str) -> bool {
    SHARED.contains(&name)
        || (language == Language::Python && PYTHON_BUILTINS.contains(&name))
}

pub fn call(
    language: Language,
    name: &str,
    args: &[Value],
    rng: &mut Prng,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match name {
        "concatenate" => {
            if args.len() < 2 {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::InvalidNumberOfArguments,
                    format!(
                        "concatenate() takes at least 2 arguments ({} given)",
                        args.len()
                    ),
                    location,
                ));
            }
            let mut result = String::new();
            for arg in args {
                result.push_str(guard_string_arg(language, "concatenate", arg, location)?);
            }
            Ok(Value::string(result))
        }
        "join" => {
            guard_exact_args("join", args, 2, location)?;
            let Value::List(elements) = &args[0] else {
                return Err(type_error(language, "join", "list", &args[0], location));
            };
            let separator = guard_string_arg(language, "join", &args[1], location)?;
            let parts: Vec<String> = elements
                .borrow()
                .iter()
                .map(|v| v.format(language))
                .collect();
            Ok(Value::string(parts.join(separator)))
        }
        "to_upper_case" => {
            guard_exact_args("to_upper_case", args, 1, location)?;
            let s = guard_string_arg(language, "to_upper_case", &args[0], location)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "to_lower_case" => {
            guard_exact_args("to_lower_case", args, 1, location)?;
            let s = guard_string_arg(language, "to_lower_case", &args[0], location)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "number_to_string" => {
            guard_exact_args("number_to_string", args, 1, location)?;
            let n = guard_number_arg(language, "number_to_string", &args[0], location)?;
            Ok(Value::string(format_number(n)))
        }
        "string_to_number" => {
            guard_exact_args("string_to_number", args, 1, location)?;
            let s = guard_string_arg(language, "string_to_number", &args[0], location)?;
            match s.trim().parse::<f64>() {
                Ok(n) => Ok(Value::Number(n)),
                Err(_) => Err(RuntimeError::new(
                    RuntimeErrorKind::TypeError,
                    format!("string_to_number(): '{}' is not a number", s),
                    location,
                )),
            }
        }
        "min" => {
            guard_exact_args("min", args, 2, location)?;
            let a = guard_number_arg(language, "min", &args[0], location)?;
            let b = guard_number_arg(language, "min", &args[1], location)?;
            Ok(Value::Number(a.min(b)))
        }
        "max" => {
            guard_exact_args("max", args, 2, location)?;
            let a = guard_number_arg(language, "max", &args[0], location)?;
            let b = guard_number_arg(language, "max", &args[1], location)?;
            Ok(Value::Number(a.max(b)))
        }
        "length" | "len" => {
            guard_exact_args(name, args, 1, location)?;
            match &args[0] {
                Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
                Value::List(elements) => Ok(Value::Number(elements.borrow().len() as f64)),
                Value::Dict(entries) => Ok(Value::Number(entries.borrow().len() as f64)),
                other => Err(type_error(language, name, "string or list", other, location)),
            }
        }
        "index_of" => {
            guard_exact_args("index_of", args, 2, location)?;
            let Value::List(elements) = &args[0] else {
                return Err(type_error(language, "index_of", "list", &args[0], location));
            };
            let found = elements.borrow().iter().position(|v| *v == args[1]);
            // 1-based to match lesson list indexing; 0 means "not found".
            Ok(Value::Number(found.map_or(0.0, |i| (i + 1) as f64)))
        }
        "random_number" => {
            guard_exact_args("random_number", args, 2, location)?;
            let min = guard_number_arg(language, "random_number", &args[0], location)? as i64;
            let max = guard_number_arg(language, "random_number", &args[1], location)? as i64;
            random_int(rng, min, max, location)
        }
        "str" => {
            guard_exact_args("str", args, 1, location)?;
            Ok(Value::string(args[0].format(language)))
        }
        "abs" => {
            guard_exact_args("abs", args, 1, location)?;
            let n = guard_number_arg(language, "abs", &args[0], location)?;
            Ok(Value::Number(n.abs()))
        }
        _ => Err(RuntimeError::new(
            RuntimeErrorKind::Internal,
            format!("stdlib function '{}' is registered but not implemented", name),
            location,
        )),
    }
}

/// Inclusive on both bounds. An impossible range is the learner's logic
/// error; it is never swapped or clamped away.
pub fn random_int(
    rng: &mut Prng,
    min: i64,
    max: i64,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    if min > max {
        return Err(RuntimeError::new(
            RuntimeErrorKind::LogicErrorInExecution,
            format!(
                "random_number: minimum ({}) cannot be greater than maximum ({})",
                min, max
            ),
            location,
        )
        .with_context("min", min.to_string())
        .with_context("max", max.to_string()));
    }
    Ok(Value::Number(rng.int_in_range(min, max) as f64))
}

fn type_error(
    language: Language,
    name: &str,
    expected: &str,
    got: &Value,
    location: SourceLocation,
) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::TypeError,
        format!(
            "{}(): argument must be a {} (got {})",
            name,
            expected,
            got.type_name(language)
        ),
        location,
    )
}
