//! # Introduction
//!
//! tracerun executes small learner programs in three front-end languages
//! (a pedagogical scripting language, a JavaScript subset, and a Python
//! subset) and records a complete, deterministic, replayable trace of the
//! run: one [`Frame`] per executed construct, carrying a deep-cloned
//! snapshot of every variable. The trace is what powers a timeline UI
//! that can scrub backward and forward through an execution like a video.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → shared AST → Interpreter → Frames
//! ```
//!
//! 1. [`lexer`] - one tokenizer per front-end language.
//! 2. [`parser`] - one recursive descent grammar per front-end, producing
//!    the shared [`ast`] statement list.
//! 3. [`interpreter`] - a single tree-walking evaluator, parameterized by
//!    [`Language`], that appends a frame per executed statement.
//! 4. [`stdlib`] - per-type built-in members and free functions, gated by
//!    a per-call allow-list.
//! 5. [`rng`] - the seeded randomness service behind `random_number`.
//!
//! ## Calling convention
//!
//! Each front-end exposes the same three operations, re-exported from the
//! [`lesson`], [`javascript`], and [`python`] modules:
//!
//! - `compile(source, &context)` - parse-only validation. Never executes
//!   anything: no external function runs, no randomness is consumed.
//! - `interpret(source, &context)` - parse and execute, returning the
//!   full [`InterpretResult`].
//! - `evaluate_function(source, &context, name, &args)` - parse and
//!   execute the whole source, then invoke one named function with the
//!   supplied arguments (used for automated grading).
//!
//! Every call is a pure, synchronous function of (source, configuration,
//! seed). All mutable state is allocated per call, so concurrent calls
//! can never observe each other.

pub mod ast;
pub mod context;
pub mod describe;
pub mod error;
pub mod frame;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod rng;
pub mod stdlib;
pub mod token;
pub mod value;

use ast::{SourceLocation, Statement};
use context::EvaluationContext;
use error::SyntaxError;
use frame::{Frame, FrameStatus, LogLine};
use interpreter::Interpreter;
use serde::Serialize;
use value::Value;

/// Which front-end grammar and runtime surface to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Language {
    /// The pedagogical scripting language (`set x to 5`).
    Lesson,
    JavaScript,
    Python,
}

/// Result of the parse-only `compile` operation.
pub type CompileResult = Result<(), SyntaxError>;

/// Metadata echoed back with every interpretation.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    /// Always the exact input source, even on error, so downstream tooling
    /// can reconstruct the failing program.
    pub source_code: String,
}

/// The full outcome of an `interpret` call.
#[derive(Debug, Clone, Serialize)]
pub struct InterpretResult {
    /// True when the program parsed and ran to completion with no error
    /// frame.
    pub success: bool,
    /// Parse-time failure, if any. Runtime failures are not reported here;
    /// they terminate `frames` with a frame of status ERROR.
    pub error: Option<SyntaxError>,
    pub frames: Vec<Frame>,
    pub log_lines: Vec<LogLine>,
    pub meta: Meta,
}

/// [`InterpretResult`] plus the invoked function's return value.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateFunctionResult {
    pub value: Option<Value>,
    #[serde(flatten)]
    pub result: InterpretResult,
}

fn parse_for(
    language: Language,
    source: &str,
    context: &EvaluationContext,
) -> Result<Vec<Statement>, SyntaxError> {
    let features = &context.language_features;
    match language {
        Language::Lesson => parser::lesson::parse(source, features),
        Language::JavaScript => parser::javascript::parse(source, features),
        Language::Python => parser::python::parse(source, features),
    }
}

/// Parse-only validation. Performs no evaluation whatsoever.
pub fn compile(language: Language, source: &str, context: &EvaluationContext) -> CompileResult {
    parse_for(language, source, context).map(|_| ())
}

/// Parse and execute, producing the full replayable trace.
pub fn interpret(language: Language, source: &str, context: &EvaluationContext) -> InterpretResult {
    let statements = match parse_for(language, source, context) {
        Ok(statements) => statements,
        Err(error) => {
            return InterpretResult {
                success: false,
                error: Some(error),
                frames: Vec::new(),
                log_lines: Vec::new(),
                meta: Meta {
                    source_code: source.to_string(),
                },
            };
        }
    };

    let mut interpreter = Interpreter::new(language, context);
    interpreter.run(&statements);
    let (frames, log_lines) = interpreter.into_outputs();

    let success = frames.iter().all(|f| f.status == FrameStatus::Success);
    InterpretResult {
        success,
        error: None,
        frames,
        log_lines,
        meta: Meta {
            source_code: source.to_string(),
        },
    }
}

/// Parse and execute the whole source, then invoke one named function
/// with the supplied arguments.
pub fn evaluate_function(
    language: Language,
    source: &str,
    context: &EvaluationContext,
    function_name: &str,
    args: &[Value],
) -> EvaluateFunctionResult {
    let statements = match parse_for(language, source, context) {
        Ok(statements) => statements,
        Err(error) => {
            return EvaluateFunctionResult {
                value: None,
                result: InterpretResult {
                    success: false,
                    error: Some(error),
                    frames: Vec::new(),
                    log_lines: Vec::new(),
                    meta: Meta {
                        source_code: source.to_string(),
                    },
                },
            };
        }
    };

    let mut interpreter = Interpreter::new(language, context);
    interpreter.run(&statements);

    let value = if interpreter_has_error(&interpreter) {
        None
    } else {
        interpreter.run_function(function_name, args, SourceLocation::new(1, 1))
    };

    let (frames, log_lines) = interpreter.into_outputs();
    let success = frames.iter().all(|f| f.status == FrameStatus::Success);

    EvaluateFunctionResult {
        value,
        result: InterpretResult {
            success,
            error: None,
            frames,
            log_lines,
            meta: Meta {
                source_code: source.to_string(),
            },
        },
    }
}

fn interpreter_has_error(interpreter: &Interpreter) -> bool {
    interpreter
        .frames()
        .iter()
        .any(|f| f.status == FrameStatus::Error)
}

macro_rules! front_end {
    ($name:ident, $language:expr, $doc:literal) => {
        #[doc = $doc]
        pub mod $name {
            use super::*;

            pub fn compile(source: &str, context: &EvaluationContext) -> CompileResult {
                super::compile($language, source, context)
            }

            pub fn interpret(source: &str, context: &EvaluationContext) -> InterpretResult {
                super::interpret($language, source, context)
            }

            pub fn evaluate_function(
                source: &str,
                context: &EvaluationContext,
                function_name: &str,
                args: &[Value],
            ) -> EvaluateFunctionResult {
                super::evaluate_function($language, source, context, function_name, args)
            }
        }
    };
}

front_end!(lesson, Language::Lesson, "The lesson front-end.");
front_end!(javascript, Language::JavaScript, "The JavaScript front-end.");
front_end!(python, Language::Python, "The Python front-end.");
