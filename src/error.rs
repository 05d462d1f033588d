//! Structured error taxonomy.
//!
//! Two disjoint categories, mirroring the two phases of a run:
//!
//! - [`SyntaxError`]: produced by a lexer or parser. Aborts before any
//!   evaluation, so no frames exist, no external function runs, and no
//!   randomness is consumed.
//! - [`RuntimeError`]: a recognized teaching error during evaluation. It
//!   never crosses the API as a host error; the interpreter terminates the
//!   frame sequence with one final ERROR frame carrying it, leaving all
//!   earlier frames inspectable.
//!
//! Anything that is *not* a recognized teaching error is an implementation
//! bug and uses [`RuntimeErrorKind::Internal`], which callers should treat
//! as fatal rather than pedagogical.

use crate::ast::SourceLocation;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of parse-time failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyntaxErrorKind {
    UnknownCharacter,
    UnterminatedString,
    UnterminatedParentheses,
    MissingExpression,
    MissingSemicolon,
    MissingEndKeyword,
    MissingColon,
    MissingIndent,
    UnexpectedDedent,
    InconsistentIndentation,
    ConstInForLoopInit,
    InvalidAssignmentTarget,
    InvalidNumber,
    UnexpectedToken,
    DisabledLanguageFeature,
}

impl SyntaxErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxErrorKind::UnknownCharacter => "UnknownCharacter",
            SyntaxErrorKind::UnterminatedString => "UnterminatedString",
            SyntaxErrorKind::UnterminatedParentheses => "UnterminatedParentheses",
            SyntaxErrorKind::MissingExpression => "MissingExpression",
            SyntaxErrorKind::MissingSemicolon => "MissingSemicolon",
            SyntaxErrorKind::MissingEndKeyword => "MissingEndKeyword",
            SyntaxErrorKind::MissingColon => "MissingColon",
            SyntaxErrorKind::MissingIndent => "MissingIndent",
            SyntaxErrorKind::UnexpectedDedent => "UnexpectedDedent",
            SyntaxErrorKind::InconsistentIndentation => "InconsistentIndentation",
            SyntaxErrorKind::ConstInForLoopInit => "ConstInForLoopInit",
            SyntaxErrorKind::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            SyntaxErrorKind::InvalidNumber => "InvalidNumber",
            SyntaxErrorKind::UnexpectedToken => "UnexpectedToken",
            SyntaxErrorKind::DisabledLanguageFeature => "DisabledLanguageFeature",
        }
    }
}

/// A parse-time error with enough positional context to point at the
/// offending token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxError {
    #[serde(rename = "type")]
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub context: BTreeMap<String, String>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        SyntaxError {
            kind,
            message: message.into(),
            line: location.line,
            column: location.column,
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {}",
            self.kind.as_str(),
            self.line,
            self.column,
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Closed set of run-time teaching-error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeErrorKind {
    VariableNotDeclared,
    VariableAlreadyDeclared,
    AssignmentToConstant,
    FunctionNotFound,
    InvalidNumberOfArguments,
    MethodNotYetAvailable,
    PropertyNotFound,
    TypeError,
    IndexOutOfBounds,
    KeyNotFound,
    ForInTargetNotDictionary,
    TargetNotIterable,
    UnexpectedBreakOutsideLoop,
    UnexpectedContinueOutsideLoop,
    UnexpectedReturnOutsideFunction,
    LogicErrorInExecution,
    FunctionExecutionError,
    MaxIterationsReached,
    /// Implementation bug, not a teaching error. Fatal to the caller.
    Internal,
}

impl RuntimeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeErrorKind::VariableNotDeclared => "VariableNotDeclared",
            RuntimeErrorKind::VariableAlreadyDeclared => "VariableAlreadyDeclared",
            RuntimeErrorKind::AssignmentToConstant => "AssignmentToConstant",
            RuntimeErrorKind::FunctionNotFound => "FunctionNotFound",
            RuntimeErrorKind::InvalidNumberOfArguments => "InvalidNumberOfArguments",
            RuntimeErrorKind::MethodNotYetAvailable => "MethodNotYetAvailable",
            RuntimeErrorKind::PropertyNotFound => "PropertyNotFound",
            RuntimeErrorKind::TypeError => "TypeError",
            RuntimeErrorKind::IndexOutOfBounds => "IndexOutOfBounds",
            RuntimeErrorKind::KeyNotFound => "KeyNotFound",
            RuntimeErrorKind::ForInTargetNotDictionary => "ForInTargetNotDictionary",
            RuntimeErrorKind::TargetNotIterable => "TargetNotIterable",
            RuntimeErrorKind::UnexpectedBreakOutsideLoop => "UnexpectedBreakOutsideLoop",
            RuntimeErrorKind::UnexpectedContinueOutsideLoop => "UnexpectedContinueOutsideLoop",
            RuntimeErrorKind::UnexpectedReturnOutsideFunction => "UnexpectedReturnOutsideFunction",
            RuntimeErrorKind::LogicErrorInExecution => "LogicErrorInExecution",
            RuntimeErrorKind::FunctionExecutionError => "FunctionExecutionError",
            RuntimeErrorKind::MaxIterationsReached => "MaxIterationsReached",
            RuntimeErrorKind::Internal => "Internal",
        }
    }
}

/// A run-time teaching error. Carried by the terminal ERROR frame; never
/// thrown across the public API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeError {
    #[serde(rename = "type")]
    pub kind: RuntimeErrorKind,
    pub message: String,
    pub line: usize,
    pub context: BTreeMap<String, String>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
            line: location.line,
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}: {}",
            self.kind.as_str(),
            self.line,
            self.message
        )
    }
}

impl std::error::Error for RuntimeError {}

/// Failure reported by a host-supplied external function.
///
/// `Logic` maps to a [`RuntimeErrorKind::LogicErrorInExecution`] frame
/// (the exercise-author's "the student did something semantically wrong"
/// channel); `Failed` maps to `FunctionExecutionError`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalError {
    #[error("{0}")]
    Logic(String),
    #[error("external function failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(
            SyntaxErrorKind::MissingExpression,
            "expected an expression after '+'",
            SourceLocation::new(3, 7),
        );
        assert_eq!(
            err.to_string(),
            "MissingExpression at line 3, column 7: expected an expression after '+'"
        );
    }

    #[test]
    fn test_runtime_error_context() {
        let err = RuntimeError::new(
            RuntimeErrorKind::MethodNotYetAvailable,
            "the method 'at' is not available yet",
            SourceLocation::new(1, 1),
        )
        .with_context("method", "at");
        assert_eq!(err.context.get("method").map(String::as_str), Some("at"));
    }
}
