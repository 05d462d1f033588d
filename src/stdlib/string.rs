//! String members.
//!
//! JavaScript exposes the camelCase surface, Python the snake_case one.
//! The lesson language has no string members; its learners use the free
//! functions in [`super::functions`] instead.

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
            &[
                "at",
                "indexOf",
                "includes",
                "startsWith",
                "endsWith",
                "toUpperCase",
                "toLowerCase",
                "trim",
                "slice",
            ],
        ),
        Language::Python => (
            &[],
            &[
                "upper", "lower", "strip", "find", "startswith", "endswith", "replace",
            ],
        ),
        Language::Lesson => (&[], &[]),
    }
}

pub(crate) fn get_property(
    receiver: &Value,
    member: &str,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let s = receiver.as_str().unwrap_or_default();
    match member {
        "length" => Ok(Value::Number(s.chars().count() as f64)),
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
    let s = receiver.as_str().unwrap_or_default();
    let chars: Vec<char> = s.chars().collect();

    match member {
        // JavaScript surface.
        "at" => {
            guard_exact_args("at", args, 1, location)?;
            let index = guard_number_arg(language, "at", &args[0], location)?;
            let index = if index < 0.0 {
                chars.len() as i64 + index as i64
            } else {
                index as i64
            };
            if index < 0 || index as usize >= chars.len() {
                Ok(Value::None)
            } else {
                Ok(Value::string(chars[index as usize].to_string()))
            }
        }
        "indexOf" => {
            guard_exact_args("indexOf", args, 1, location)?;
            let needle = guard_string_arg(language, "indexOf", &args[0], location)?;
            Ok(Value::Number(char_index_of(&chars, needle)))
        }
        "includes" => {
            guard_exact_args("includes", args, 1, location)?;
            let needle = guard_string_arg(language, "includes", &args[0], location)?;
            Ok(Value::Bool(s.contains(needle)))
        }
        "startsWith" => {
            guard_exact_args("startsWith", args, 1, location)?;
            let prefix = guard_string_arg(language, "startsWith", &args[0], location)?;
            Ok(Value::Bool(s.starts_with(prefix)))
        }
        "endsWith" => {
            guard_exact_args("endsWith", args, 1, location)?;
            let suffix = guard_string_arg(language, "endsWith", &args[0], location)?;
            Ok(Value::Bool(s.ends_with(suffix)))
        }
        "toUpperCase" => {
            guard_exact_args("toUpperCase", args, 0, location)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "toLowerCase" => {
            guard_exact_args("toLowerCase", args, 0, location)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "trim" => {
            guard_exact_args("trim", args, 0, location)?;
            Ok(Value::string(s.trim()))
        }
        "slice" => {
            // Teaching mode insists on explicit bounds; native mode keeps
            // the host language's defaults.
            if features.native_js_mode {
                guard_arg_range("slice", args, 0, 2, location)?;
            } else {
                guard_arg_range("slice", args, 1, 2, location)?;
            }
            let start = match args.first() {
                Some(arg) => guard_number_arg(language, "slice", arg, location)? as i64,
                None => 0,
            };
            let end = match args.get(1) {
                Some(arg) => guard_number_arg(language, "slice", arg, location)? as i64,
                None => chars.len() as i64,
            };
            Ok(Value::string(slice_chars(&chars, start, end)))
        }

        // Python surface.
        "upper" => {
            guard_exact_args("upper", args, 0, location)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "lower" => {
            guard_exact_args("lower", args, 0, location)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "strip" => {
            guard_exact_args("strip", args, 0, location)?;
            Ok(Value::string(s.trim()))
        }
        "find" => {
            guard_exact_args("find", args, 1, location)?;
            let needle = guard_string_arg(language, "find", &args[0], location)?;
            Ok(Value::Number(char_index_of(&chars, needle)))
        }
        "startswith" => {
            guard_exact_args("startswith", args, 1, location)?;
            let prefix = guard_string_arg(language, "startswith", &args[0], location)?;
            Ok(Value::Bool(s.starts_with(prefix)))
        }
        "endswith" => {
            guard_exact_args("endswith", args, 1, location)?;
            let suffix = guard_string_arg(language, "endswith", &args[0], location)?;
            Ok(Value::Bool(s.ends_with(suffix)))
        }
        "replace" => {
            guard_exact_args("replace", args, 2, location)?;
            let from = guard_string_arg(language, "replace", &args[0], location)?;
            let to = guard_string_arg(language, "replace", &args[1], location)?;
            Ok(Value::string(s.replace(from, to)))
        }

        _ => Err(internal_member_error(member, location)),
    }
}

/// Index of `needle` in character units, or -1.
fn char_index_of(chars: &[char], needle: &str) -> f64 {
    if needle.is_empty() {
        return 0.0;
    }
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.len() > chars.len() {
        return -1.0;
    }
    for start in 0..=(chars.len() - needle_chars.len()) {
        if chars[start..start + needle_chars.len()] == needle_chars[..] {
            return start as f64;
        }
    }
    -1.0
}

fn slice_chars(chars: &[char], start: i64, end: i64) -> String {
    let len = chars.len() as i64;
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len) as usize
    };
    let (start, end) = (clamp(start), clamp(end));
    if start >= end {
        String::new()
    } else {
        chars[start..end].iter().collect()
    }
}

/// The registry dispatched here, but the member table disagrees with the
/// implementation: an invariant violation, not a teaching error.
fn internal_member_error(member: &str, location: SourceLocation) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::Internal,
        format!("string member '{}' is registered but not implemented", member),
        location,
    )
}
