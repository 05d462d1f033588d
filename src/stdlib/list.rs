//! List members.

use super::{guard_arg_range, guard_exact_args, guard_number_arg, guard_string_arg};
use crate::ast::SourceLocation;
use crate::context::LanguageFeatures;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;
use crate::Language;

pub(crate) fn members(language: Language) -> (&'static [&'static str], &'static [&'static str]) {
    match language {
        Language::JavaScript => (
            &["length"],
            &["at", "push", "pop", "indexOf", "includes", "join", "slice"],
        ),
        Language::Python => (&[], &["append", "pop", "index", "remove", "count"]),
        Language::Lesson => (&[], &[]),
    }
}

pub(crate) fn get_property(
    receiver: &Value,
    member: &str,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let Value::List(elements) = receiver else {
        return Err(internal_member_error(member, location));
    };
    match member {
        "length" => Ok(Value::Number(elements.borrow().len() as f64)),
        _ => Err(internal_member_error(member, location)),
    }
}

pub(crate) fn call_method(
    language: Language,
    receiver: &Value,
    member: &str,
    args: &[Value],
    features: &LanguageFeatures,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let Value::List(elements) = receiver else {
        return Err(internal_member_error(member, location));
    };

    match member {
        // JavaScript surface.
        "at" => {
            guard_exact_args("at", args, 1, location)?;
            let index = guard_number_arg(language, "at", &args[0], location)?;
            let len = elements.borrow().len() as i64;
            let index = if index < 0.0 {
                len + index as i64
            } else {
                index as i64
            };
            if index < 0 || index >= len {
                Ok(Value::None)
            } else {
                Ok(elements.borrow()[index as usize].clone())
            }
        }
        "push" => {
            guard_exact_args("push", args, 1, location)?;
            elements.borrow_mut().push(args[0].clone());
            Ok(Value::Number(elements.borrow().len() as f64))
        }
        "pop" if language == Language::JavaScript => {
            guard_exact_args("pop", args, 0, location)?;
            Ok(elements.borrow_mut().pop().unwrap_or(Value::None))
        }
        "indexOf" => {
            guard_exact_args("indexOf", args, 1, location)?;
            let found = elements.borrow().iter().position(|v| *v == args[0]);
            Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
        }
        "includes" => {
            guard_exact_args("includes", args, 1, location)?;
            let found = elements.borrow().iter().any(|v| *v == args[0]);
            Ok(Value::Bool(found))
        }
        "join" => {
            // In teaching mode the separator is explicit; native mode keeps
            // JavaScript's "," default.
            if features.native_js_mode {
                guard_arg_range("join", args, 0, 1, location)?;
            } else {
                guard_exact_args("join", args, 1, location)?;
            }
            let separator = match args.first() {
                Some(arg) => guard_string_arg(language, "join", arg, location)?.to_string(),
                None => ",".to_string(),
            };
            let parts: Vec<String> = elements
                .borrow()
                .iter()
                .map(|v| v.format(language))
                .collect();
            Ok(Value::string(parts.join(&separator)))
        }
        "slice" => {
            if features.native_js_mode {
                guard_arg_range("slice", args, 0, 2, location)?;
            } else {
                guard_arg_range("slice", args, 1, 2, location)?;
            }
            let len = elements.borrow().len() as i64;
            let clamp = |i: i64| -> usize {
                let i = if i < 0 { len + i } else { i };
                i.clamp(0, len) as usize
            };
            let start = match args.first() {
                Some(arg) => clamp(guard_number_arg(language, "slice", arg, location)? as i64),
                None => 0,
            };
            let end = match args.get(1) {
                Some(arg) => clamp(guard_number_arg(language, "slice", arg, location)? as i64),
                None => len as usize,
            };
            let sliced: Vec<Value> = if start >= end {
                Vec::new()
            } else {
                elements.borrow()[start..end]
                    .iter()
                    .map(Value::deep_clone)
                    .collect()
            };
            Ok(Value::list(sliced))
        }

        // Python surface.
        "append" => {
            guard_exact_args("append", args, 1, location)?;
            elements.borrow_mut().push(args[0].clone());
            Ok(Value::None)
        }
        "pop" => {
            guard_arg_range("pop", args, 0, 1, location)?;
            let mut elements = elements.borrow_mut();
            let len = elements.len();
            let index = match args.first() {
                Some(arg) => {
                    let i = guard_number_arg(language, "pop", arg, location)? as i64;
                    if i < 0 { len as i64 + i } else { i }
                }
                None => len as i64 - 1,
            };
            if index < 0 || index as usize >= len {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::IndexOutOfBounds,
                    format!("pop index {} is out of range for a list of {}", index, len),
                    location,
                ));
            }
            Ok(elements.remove(index as usize))
        }
        "index" => {
            guard_exact_args("index", args, 1, location)?;
            let found = elements.borrow().iter().position(|v| *v == args[0]);
            match found {
                Some(i) => Ok(Value::Number(i as f64)),
                None => Err(RuntimeError::new(
                    RuntimeErrorKind::KeyNotFound,
                    format!("{} is not in the list", args[0].format(language)),
                    location,
                )),
            }
        }
        "remove" => {
            guard_exact_args("remove", args, 1, location)?;
            let found = elements.borrow().iter().position(|v| *v == args[0]);
            match found {
                Some(i) => {
                    elements.borrow_mut().remove(i);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::new(
                    RuntimeErrorKind::KeyNotFound,
                    format!("{} is not in the list", args[0].format(language)),
                    location,
                )),
            }
        }
        "count" => {
            guard_exact_args("count", args, 1, location)?;
            let count = elements.borrow().iter().filter(|v| **v == args[0]).count();
            Ok(Value::Number(count as f64))
        }

        _ => Err(internal_member_error(member, location)),
    }
}

fn internal_member_error(member: &str, location: SourceLocation) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::Internal,
        format!("list member '{}' is registered but not implemented", member),
        location,
    )
}
