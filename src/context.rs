//! Per-call configuration: language feature restrictions, the stdlib
//! allow-list, external functions, and the execution-control handle those
//! functions receive.
//!
//! Everything here is passed explicitly into each top-level call. There is
//! deliberately no global or shared mutable configuration, so concurrent
//! calls can never cross-talk.

use crate::ast::Construct;
use crate::error::ExternalError;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Per-type stdlib allow-list: which properties and methods are visible.
#[derive(Debug, Clone, Default)]
pub struct TypeAllowList {
    pub properties: Vec<String>,
    pub methods: Vec<String>,
}

/// Allow-lists keyed by language-facing type name ("string", "array",
/// "list", "number", "dictionary", ...). A type with no entry is
/// unrestricted.
#[derive(Debug, Clone, Default)]
pub struct StdlibAllowList {
    pub types: BTreeMap<String, TypeAllowList>,
}

impl StdlibAllowList {
    pub fn allow(mut self, type_name: &str, properties: &[&str], methods: &[&str]) -> Self {
        self.types.insert(
            type_name.to_string(),
            TypeAllowList {
                properties: properties.iter().map(|s| s.to_string()).collect(),
                methods: methods.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }
}

/// Enumerated restrictions scoping an exercise to what the learner has
/// been taught.
#[derive(Debug, Clone)]
pub struct LanguageFeatures {
    /// JavaScript front-end: statements must end with `;`.
    pub require_semicolons: bool,
    /// Syntax constructs that parse as `DisabledLanguageFeature` errors.
    pub exclude_list: Vec<Construct>,
    /// Per-type member allow-lists. `None` leaves every member visible.
    pub allowed_stdlib: Option<StdlibAllowList>,
    /// Free stdlib functions available to the program. `None` = all.
    pub allowed_stdlib_functions: Option<Vec<String>>,
    /// Relax argument-count strictness to mirror host-language semantics.
    pub native_js_mode: bool,
    /// Ceiling across all ordinary loop iterations in one run.
    pub max_total_loop_iterations: u32,
    /// Ceiling for `repeat_forever` when the completion signal never fires.
    pub max_repeat_forever_iterations: u32,
}

impl Default for LanguageFeatures {
    fn default() -> Self {
        LanguageFeatures {
            require_semicolons: false,
            exclude_list: Vec::new(),
            allowed_stdlib: None,
            allowed_stdlib_functions: None,
            native_js_mode: false,
            max_total_loop_iterations: 10_000,
            max_repeat_forever_iterations: 1_000,
        }
    }
}

impl LanguageFeatures {
    pub fn excludes(&self, construct: Construct) -> bool {
        self.exclude_list.contains(&construct)
    }
}

/// Arity accepted by an external function (user-visible arguments only;
/// the execution-control handle is not counted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub fn exactly(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

/// The execution-control handle passed to every external function call.
///
/// The interpreter constructs a fresh handle per call and applies the
/// recorded effects afterwards; the callable never holds a reference into
/// live interpreter state.
#[derive(Debug)]
pub struct ExecutionContext {
    pub(crate) time: u64,
    pub(crate) finished: bool,
    pub(crate) fast_forwarded: u64,
    pub(crate) logged: Vec<String>,
}

impl ExecutionContext {
    pub(crate) fn new(time: u64) -> Self {
        ExecutionContext {
            time,
            finished: false,
            fast_forwarded: 0,
            logged: Vec::new(),
        }
    }

    /// Current logical time.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Mark the exercise run as complete. A `repeat_forever` loop honors
    /// this at the next iteration boundary: the iteration in progress
    /// finishes all of its statements first.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Advance logical time by `units` milliseconds (used by curriculum
    /// code to pace animations).
    pub fn fast_forward(&mut self, units: u64) {
        self.fast_forwarded += units * 1000;
    }

    /// Append a log line at the current logical time.
    pub fn log(&mut self, output: impl Into<String>) {
        self.logged.push(output.into());
    }

    /// Convenience constructor for the exercise-author error channel:
    /// `return Err(ctx.logic_error("you moved off the board"))`.
    pub fn logic_error(&self, message: impl Into<String>) -> ExternalError {
        ExternalError::Logic(message.into())
    }
}

/// Signature of a host-supplied callable. The handle comes first, then the
/// evaluated user arguments.
pub type ExternalFn = Rc<dyn Fn(&mut ExecutionContext, &[Value]) -> Result<Value, ExternalError>>;

/// A host-supplied function injected into the program's global scope.
#[derive(Clone)]
pub struct ExternalFunction {
    pub name: String,
    pub func: ExternalFn,
    pub description: String,
    /// `None` means any argument count is accepted.
    pub arity: Option<Arity>,
}

impl ExternalFunction {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        arity: Option<Arity>,
        func: impl Fn(&mut ExecutionContext, &[Value]) -> Result<Value, ExternalError> + 'static,
    ) -> Self {
        ExternalFunction {
            name: name.into(),
            description: description.into(),
            arity,
            func: Rc::new(func),
        }
    }
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Everything a top-level call needs besides the source string.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    pub language_features: LanguageFeatures,
    pub external_functions: Vec<ExternalFunction>,
    /// Seed for the randomness service; `None` draws from host entropy.
    pub random_seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::exactly(2).accepts(2));
        assert!(!Arity::exactly(2).accepts(3));
        assert!(Arity::at_least(1).accepts(99));
        assert!(!Arity::at_least(1).accepts(0));
    }

    #[test]
    fn test_execution_context_effects() {
        let mut ctx = ExecutionContext::new(10);
        assert_eq!(ctx.time(), 10);
        ctx.finish();
        ctx.fast_forward(5);
        ctx.log("hello");
        assert!(ctx.finished);
        assert_eq!(ctx.fast_forwarded, 5000);
        assert_eq!(ctx.logged, vec!["hello".to_string()]);
    }
}
