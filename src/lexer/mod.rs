//! Front-end lexers.
//!
//! One hand-written lexer per learner language, all producing the shared
//! [`crate::token::Token`] stream contract:
//! - [`lesson`]: the pedagogical scripting language (newline-terminated
//!   statements, `do … end` blocks)
//! - [`javascript`]: a JavaScript subset (brace blocks, optional or
//!   required semicolons)
//! - [`python`]: a Python subset (significant indentation synthesized
//!   into INDENT/DEDENT tokens)
//!
//! Every token carries a line and column so parse errors and frames can
//! point at exact source positions.

pub mod javascript;
pub mod lesson;
pub mod python;
