//! Standard-library layer: per-type built-in members and free functions,
//! gated by the per-call allow-list.
//!
//! Three distinct failure signals, because they teach different things:
//! - [`crate::error::RuntimeErrorKind::MethodNotYetAvailable`]: the member
//!   exists but the exercise has not unlocked it yet
//! - [`crate::error::RuntimeErrorKind::PropertyNotFound`]: the member does
//!   not exist on this type at all
//! - [`crate::error::RuntimeErrorKind::TypeError`]: the member exists and
//!   is allowed, but was used wrongly (bad argument type, property called
//!   as a method, method read as a property)
//!
//! Argument-count mismatches are always `InvalidNumberOfArguments`.

pub mod functions;
pub mod list;
pub mod number;
pub mod string;

use crate::ast::SourceLocation;
use crate::context::LanguageFeatures;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;
use crate::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
}

/// Outcome of looking a member up in a type's registry, before allow-list
/// gating is applied.
pub(crate) enum Lookup {
    Property,
    Method,
    Unknown,
}

pub(crate) fn lookup_member(language: Language, receiver: &Value, member: &str) -> Lookup {
    let (properties, methods): (&[&str], &[&str]) = match receiver {
        Value::Str(_) => string::members(language),
        Value::List(_) => list::members(language),
        Value::Number(_) => number::members(language),
        _ => (&[], &[]),
    };

    if properties.contains(&member) {
        Lookup::Property
    } else if methods.contains(&member) {
        Lookup::Method
    } else {
        Lookup::Unknown
    }
}

/// Read a stdlib property such as `items.length`.
pub fn get_property(
    language: Language,
    receiver: &Value,
    member: &str,
    features: &LanguageFeatures,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match lookup_member(language, receiver, member) {
        Lookup::Property => {
            guard_allowed(language, receiver, member, MemberKind::Property, features, location)?;
            match receiver {
                Value::Str(_) => string::get_property(receiver, member, location),
                Value::List(_) => list::get_property(receiver, member, location),
                Value::Number(_) => number::get_property(receiver, member, location),
                _ => Err(property_not_found(language, receiver, member, location)),
            }
        }
        Lookup::Method => Err(RuntimeError::new(
            RuntimeErrorKind::TypeError,
            format!("'{}' is a method; call it with parentheses", member),
            location,
        )
        .with_context("method", member)),
        Lookup::Unknown => Err(property_not_found(language, receiver, member, location)),
    }
}

/// Call a stdlib method such as `text.toUpperCase()`.
pub fn call_method(
    language: Language,
    receiver: &Value,
    member: &str,
    args: &[Value],
    features: &LanguageFeatures,
    location: SourceLocation,
) -> Result<Value, RuntimeError> {
    match lookup_member(language, receiver, member) {
        Lookup::Method => {
            guard_allowed(language, receiver, member, MemberKind::Method, features, location)?;
            match receiver {
                Value::Str(_) => string::call_method(language, receiver, member, args, features, location),
                Value::List(_) => list::call_method(language, receiver, member, args, features, location),
                Value::Number(_) => number::call_method(language, receiver, member, args, features, location),
                _ => Err(property_not_found(language, receiver, member, location)),
            }
        }
        Lookup::Property => Err(RuntimeError::new(
            RuntimeErrorKind::TypeError,
            format!("'{}' is a property, not a method", member),
            location,
        )
        .with_context("property", member)),
        Lookup::Unknown => Err(property_not_found(language, receiver, member, location)),
    }
}

fn guard_allowed(
    language: Language,
    receiver: &Value,
    member: &str,
    kind: MemberKind,
    features: &LanguageFeatures,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    let Some(allow_list) = &features.allowed_stdlib else {
        return Ok(());
    };
    let type_name = receiver.type_name(language);
    let Some(type_list) = allow_list.types.get(type_name) else {
        return Ok(());
    };

    let allowed = match kind {
        MemberKind::Property => type_list.properties.iter().any(|p| p == member),
        MemberKind::Method => type_list.methods.iter().any(|m| m == member),
    };

    if allowed {
        Ok(())
    } else {
        Err(RuntimeError::new(
            RuntimeErrorKind::MethodNotYetAvailable,
            format!(
                "'{}' exists on {} values, but it is not available in this exercise yet",
                member, type_name
            ),
            location,
        )
        .with_context("method", member)
        .with_context("type", type_name))
    }
}

fn property_not_found(
    language: Language,
    receiver: &Value,
    member: &str,
    location: SourceLocation,
) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::PropertyNotFound,
        format!(
            "{} values have no property or method called '{}'",
            receiver.type_name(language),
            member
        ),
        location,
    )
    .with_context("member", member.to_string())
    .with_context("type", receiver.type_name(language))
}

// Argument guards shared by the member implementations.

pub(crate) fn guard_exact_args(
    name: &str,
    args: &[Value],
    expected: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        let plural = if expected == 1 { "" } else { "s" };
        Err(RuntimeError::new(
            RuntimeErrorKind::InvalidNumberOfArguments,
            format!(
                "{}() takes exactly {} argument{} ({} given)",
                name,
                expected,
                plural,
                args.len()
            ),
            location,
        )
        .with_context("expected", expected.to_string())
        .with_context("received", args.len().to_string()))
    } else {
        Ok(())
    }
}

pub(crate) fn guard_arg_range(
    name: &str,
    args: &[Value],
    min: usize,
    max: usize,
    location: SourceLocation,
) -> Result<(), RuntimeError> {
    if args.len() < min || args.len() > max {
        Err(RuntimeError::new(
            RuntimeErrorKind::InvalidNumberOfArguments,
            format!(
                "{}() takes from {} to {} arguments ({} given)",
                name,
                min,
                max,
                args.len()
            ),
            location,
        )
        .with_context("received", args.len().to_string()))
    } else {
        Ok(())
    }
}

pub(crate) fn guard_number_arg(
    language: Language,
    name: &str,
    arg: &Value,
    location: SourceLocation,
) -> Result<f64, RuntimeError> {
    arg.as_number().ok_or_else(|| {
        RuntimeError::new(
            RuntimeErrorKind::TypeError,
            format!(
                "{}(): argument must be a number (got {})",
                name,
                arg.type_name(language)
            ),
            location,
        )
        .with_context("expected", "number")
        .with_context("received", arg.type_name(language))
    })
}

pub(crate) fn guard_string_arg<'v>(
    language: Language,
    name: &str,
    arg: &'v Value,
    location: SourceLocation,
) -> Result<&'v str, RuntimeError> {
    arg.as_str().ok_or_else(|| {
        RuntimeError::new(
            RuntimeErrorKind::TypeError,
            format!(
                "{}(): argument must be a string (got {})",
                name,
                arg.type_name(language)
            ),
            location,
        )
        .with_context("expected", "string")
        .with_context("received", arg.type_name(language))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StdlibAllowList;

    #[test]
    fn test_restricted_member_is_not_yet_available() {
        let features = LanguageFeatures {
            allowed_stdlib: Some(StdlibAllowList::default().allow("array", &["length"], &[])),
            ..LanguageFeatures::default()
        };
        let list = Value::list(vec![Value::Number(1.0)]);
        let err = call_method(
            Language::JavaScript,
            &list,
            "at",
            &[Value::Number(0.0)],
            &features,
            SourceLocation::new(1, 1),
        )
        .unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::MethodNotYetAvailable);
        assert_eq!(err.context.get("method").map(String::as_str), Some("at"));
    }

    #[test]
    fn test_unknown_member_is_property_not_found() {
        let list = Value::list(vec![]);
        let err = call_method(
            Language::JavaScript,
            &list,
            "shuffle",
            &[],
            &LanguageFeatures::default(),
            SourceLocation::new(1, 1),
        )
        .unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::PropertyNotFound);
    }

    #[test]
    fn test_property_called_as_method_is_type_error() {
        let list = Value::list(vec![]);
        let err = call_method(
            Language::JavaScript,
            &list,
            "length",
            &[],
            &LanguageFeatures::default(),
            SourceLocation::new(1, 1),
        )
        .unwrap_err();
        assert_eq!(err.kind, RuntimeErrorKind::TypeError);
    }
}
