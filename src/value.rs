//! Runtime value representation.
//!
//! [`Value`] is the tagged union of everything a learner program can
//! produce: numbers, strings, booleans, lists, dictionaries, and the
//! none/null value. Lists and dictionaries are reference values (aliasing
//! through variables is observable, mirroring the front-end languages),
//! which is why frame snapshots go through [`Value::deep_clone`]: a deep
//! clone shares no interior cells with the live program, so later mutation
//! can never reach an already-captured snapshot.

use crate::Language;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Runtime values in the interpreter.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<BTreeMap<String, Value>>>),
    None,
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// A fully-independent copy: fresh interior cells at every level.
    /// This is the snapshot mechanism for frames.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::List(elements) => {
                let cloned = elements.borrow().iter().map(Value::deep_clone).collect();
                Value::list(cloned)
            }
            Value::Dict(entries) => {
                let cloned = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect();
                Value::dict(cloned)
            }
            other => other.clone(),
        }
    }

    /// The language-facing type name, used in error messages.
    pub fn type_name(&self, language: Language) -> &'static str {
        match (self, language) {
            (Value::Number(_), _) => "number",
            (Value::Str(_), Language::Python) => "str",
            (Value::Str(_), _) => "string",
            (Value::Bool(_), Language::Python) => "bool",
            (Value::Bool(_), _) => "boolean",
            (Value::List(_), Language::JavaScript) => "array",
            (Value::List(_), _) => "list",
            (Value::Dict(_), Language::JavaScript) => "object",
            (Value::Dict(_), Language::Python) => "dict",
            (Value::Dict(_), _) => "dictionary",
            (Value::None, Language::Python) => "NoneType",
            (Value::None, Language::JavaScript) => "null",
            (Value::None, _) => "nothing",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truthiness for condition positions. The lesson language has no
    /// implicit coercion (the caller rejects non-booleans before asking);
    /// JavaScript and Python follow their host rules.
    pub fn is_truthy(&self, language: Language) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(elements) => match language {
                // Empty arrays are truthy in JavaScript.
                Language::JavaScript => true,
                _ => !elements.borrow().is_empty(),
            },
            Value::Dict(entries) => match language {
                Language::JavaScript => true,
                _ => !entries.borrow().is_empty(),
            },
            Value::None => false,
        }
    }

    /// Render the value the way the front-end language displays it.
    /// Top-level strings render bare; strings inside containers are quoted.
    pub fn format(&self, language: Language) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.format_nested(language),
        }
    }

    fn format_nested(&self, language: Language) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Str(s) => match language {
                Language::Python => format!("'{}'", s),
                _ => format!("\"{}\"", s),
            },
            Value::Bool(b) => match language {
                Language::Python => if *b { "True" } else { "False" }.to_string(),
                _ => b.to_string(),
            },
            Value::List(elements) => {
                let parts: Vec<String> = elements
                    .borrow()
                    .iter()
                    .map(|v| v.format_nested(language))
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Dict(entries) => {
                let parts: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| match language {
                        Language::Python => format!("'{}': {}", k, v.format_nested(language)),
                        _ => format!("\"{}\": {}", k, v.format_nested(language)),
                    })
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::None => match language {
                Language::Python => "None".to_string(),
                Language::JavaScript => "null".to_string(),
                Language::Lesson => "nothing".to_string(),
            },
        }
    }
}

/// Numbers print without a trailing `.0` when integral, matching how the
/// front-end languages display them.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Structural deep equality; used by `==` in all three front-ends.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                *a.borrow() == *b.borrow()
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                *a.borrow() == *b.borrow()
            }
            _ => false,
        }
    }
}

/// Serializes as plain JSON data: the interior cells are an implementation
/// detail the trace consumers never see.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::None => serializer.serialize_unit(),
            Value::List(elements) => {
                let elements = elements.borrow();
                let mut seq = serializer.serialize_seq(Some(elements.len()))?;
                for element in elements.iter() {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_clone_is_independent() {
        let inner = Value::list(vec![Value::Number(1.0)]);
        let outer = Value::list(vec![inner.clone(), Value::Number(2.0)]);
        let snapshot = outer.deep_clone();

        if let Value::List(elements) = &inner {
            elements.borrow_mut().push(Value::Number(99.0));
        }

        if let Value::List(elements) = &snapshot {
            let first = elements.borrow()[0].clone();
            if let Value::List(inner_elements) = first {
                assert_eq!(inner_elements.borrow().len(), 1);
            } else {
                panic!("expected nested list");
            }
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::list(vec![Value::Number(1.0), Value::string("x")]);
        let b = Value::list(vec![Value::Number(1.0), Value::string("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn test_format_per_language() {
        let v = Value::list(vec![Value::Bool(true), Value::string("hi")]);
        assert_eq!(v.format(Language::JavaScript), "[true, \"hi\"]");
        assert_eq!(v.format(Language::Python), "[True, 'hi']");
    }
}
