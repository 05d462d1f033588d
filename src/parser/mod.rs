//! Front-end parsers.
//!
//! Hand-written recursive descent, one grammar per learner language, all
//! producing the shared [`crate::ast`] statement list. On malformed input
//! every parser fails fast with a structured [`crate::error::SyntaxError`]
//! - no partial AST, no silent recovery - which is what lets `compile`
//! guarantee that nothing was executed.
//!
//! No external parser generator dependencies.

pub mod javascript;
pub mod lesson;
pub mod python;
