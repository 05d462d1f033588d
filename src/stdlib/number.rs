//! Number members. A deliberately small surface: most numeric work in the
//! curriculum goes through operators and the free functions.

use super::{guard_arg_range, guard_exact_args, guard_number_arg};
use crate::ast::SourceLocation;
use crate::context::LanguageFeatures;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;
use crate::Language;

pub(crate) fn members(language: Language) -> (&'static [&'static str], &'static [&'static str]) {
    match language {
        Language::JavaScript => (&[], &["toFixed", "toString"]),
        _ => (&[], &[]),
    }
}

pub(crate) fn get_property(
    _receiver: &Value,
    member: &str,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    Err(internal_member_error(member, location))
}

pub(crate) fn call_method(
    language: Language,
    receiver: &Value,
    member: &str,
    args: &[Value],
    features: &LanguageFeatures,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    let n = receiver.as_number().unwrap_or_default();

    match member {
        "toFixed" => {
            if features.native_js_mode {
                guard_arg_range("toFixed", args, 0, 1, location)?;
            } else {
                guard_exact_args("toFixed", args, 1, location)?;
            }
            let digits = match args.first() {
                Some(arg) => guard_number_arg(language, "toFixed", arg, location)? as usize,
                None => 0,
            };
            Ok(Value::string(format!("{:.*}", digits, n)))
        }
        "toString" => {
            guard_exact_args("toString", args, 0, location)?;
            Ok(Value::string(crate::value::format_number(n)))
        }
        _ => Err(internal_member_error(member, location)),
    }
}

fn internal_member_error(member: &str, location: SourceLocation) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::Internal,
        format!("number member '{}' is registered but not implemented", member),
        location,
    )
}
