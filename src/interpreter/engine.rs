// Execution engine shared by the three front-ends.

use crate::ast::{SourceLocation, Statement};
use crate::context::{EvaluationContext, ExecutionContext, ExternalFunction, LanguageFeatures};
use crate::error::{ExternalError, RuntimeError, RuntimeErrorKind};
use crate::frame::{Frame, FrameContext, LogLine};
use crate::interpreter::environment::Environment;
use crate::rng::Prng;
use crate::value::Value;
use crate::Language;
use rustc_hash::FxHashMap;

/// Maximum user-function call depth. Deep recursion in learner code is a
/// bug in the learner's program, and must not overflow the host stack.
const MAX_CALL_DEPTH: usize = 100;

/// A user-defined function captured when its declaration executes.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

/// Control flow propagated up through statement execution as an explicit
/// result, never as a host exception.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break(SourceLocation),
    Continue(SourceLocation),
    Return(Option<Value>, SourceLocation),
}

/// The main interpreter. All of its state is allocated per run; nothing
/// survives between top-level calls.
pub struct Interpreter {
    pub(crate) language: Language,
    pub(crate) features: LanguageFeatures,
    pub(crate) environment: Environment,
    pub(crate) functions: FxHashMap<String, FunctionDef>,
    pub(crate) externals: FxHashMap<String, ExternalFunction>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) log_lines: Vec<LogLine>,
    pub(crate) time: u64,
    pub(crate) rng: Prng,
    /// Set by the external-function completion signal; honored by
    /// repeat-forever loops at iteration boundaries.
    pub(crate) finished: bool,
    pub(crate) total_loop_iterations: u32,
    pub(crate) call_depth: usize,
}

impl Interpreter {
    pub fn new(language: Language, context: &EvaluationContext) -> Self {
        let externals = context
            .external_functions
            .iter()
            .map(|f| (f.name.clone(), f.clone()))
            .collect();

        let rng = match context.random_seed {
            Some(seed) => Prng::seeded(seed),
            None => Prng::from_entropy(),
        };

        Interpreter {
            language,
            features: context.language_features.clone(),
            environment: Environment::new(),
            functions: FxHashMap::default(),
            externals,
            frames: Vec::new(),
            log_lines: Vec::new(),
            time: 0,
            rng,
            finished: false,
            total_loop_iterations: 0,
            call_depth: 0,
        }
    }

    /// Execute a statement list to completion or first error. Runtime
    /// errors never escape: they become the terminal ERROR frame.
    pub fn run(&mut self, statements: &[Statement]) {
        for statement in statements {
            match self.execute_statement(statement) {
                Ok(Flow::Normal) => {}
                Ok(flow) => {
                    let error = self.unconsumed_flow_error(flow);
                    self.push_error_frame(error);
                    return;
                }
                Err(error) => {
                    self.push_error_frame(error);
                    return;
                }
            }
        }
    }

    /// Invoke one named, already-declared function with host-supplied
    /// arguments, recording frames like any other execution.
    pub fn run_function(&mut self, name: &str, args: &[Value], location: SourceLocation) -> Option<Value> {
        let result = self.call_user_function(name, args, location);
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push_error_frame(error);
                None
            }
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_outputs(self) -> (Vec<Frame>, Vec<LogLine>) {
        (self.frames, self.log_lines)
    }

    // Frame recording.

    pub(crate) fn push_success_frame(
        &mut self,
        location: SourceLocation,
        context: FrameContext,
        result: Option<&Value>,
    ) {
        let frame = Frame::success(
            self.time,
            location,
            result.map(Value::deep_clone),
            self.environment.snapshot(),
            context,
            self.language,
        );
        self.frames.push(frame);
        self.time += 1;
    }

    pub(crate) fn push_error_frame(&mut self, error: RuntimeError) {
        let location = SourceLocation::new(error.line, 1);
        let frame = Frame::error(
            self.time,
            location,
            self.environment.snapshot(),
            error,
            self.language,
        );
        self.frames.push(frame);
        self.time += 1;
    }

    pub(crate) fn push_log_line(&mut self, output: String) {
        self.log_lines.push(LogLine {
            time: self.time,
            output,
        });
    }

    /// Break/continue/return that reached somewhere it cannot be consumed.
    /// The statement already recorded a SUCCESS frame for itself; replace
    /// it with the error frame.
    pub(crate) fn unconsumed_flow_error(&mut self, flow: Flow) -> RuntimeError {
        self.frames.pop();
        match flow {
            Flow::Break(location) => RuntimeError::new(
                RuntimeErrorKind::UnexpectedBreakOutsideLoop,
                "'break' can only be used inside a loop",
                location,
            ),
            Flow::Continue(location) => RuntimeError::new(
                RuntimeErrorKind::UnexpectedContinueOutsideLoop,
                "'continue' can only be used inside a loop",
                location,
            ),
            Flow::Return(_, location) => RuntimeError::new(
                RuntimeErrorKind::UnexpectedReturnOutsideFunction,
                "'return' can only be used inside a function",
                location,
            ),
            Flow::Normal => RuntimeError::new(
                RuntimeErrorKind::Internal,
                "normal flow treated as unconsumed",
                SourceLocation::new(1, 1),
            ),
        }
    }

    // Function dispatch.

    pub(crate) fn call_user_function(
        &mut self,
        name: &str,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        let function = self.functions.get(name).cloned().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::FunctionNotFound,
                format!("there is no function called '{}'", name),
                location,
            )
            .with_context("name", name.to_string())
        })?;

        if args.len() != function.params.len() {
            let plural = if function.params.len() == 1 { "" } else { "s" };
            return Err(RuntimeError::new(
                RuntimeErrorKind::InvalidNumberOfArguments,
                format!(
                    "{}() takes {} argument{} ({} given)",
                    name,
                    function.params.len(),
                    plural,
                    args.len()
                ),
                location,
            )
            .with_context("name", name.to_string())
            .with_context("expected", function.params.len().to_string())
            .with_context("received", args.len().to_string()));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(
                RuntimeErrorKind::MaxIterationsReached,
                format!("{}() exceeded the maximum call depth", name),
                location,
            ));
        }

        self.call_depth += 1;
        self.environment.push_function_scope();
        for (param, arg) in function.params.iter().zip(args) {
            self.environment.define(param, arg.clone(), false);
        }

        let mut result = Ok(Value::None);
        for statement in &function.body {
            match self.execute_statement(statement) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(value, _)) => {
                    result = Ok(value.unwrap_or(Value::None));
                    break;
                }
                Ok(flow) => {
                    result = Err(self.unconsumed_flow_error(flow));
                    break;
                }
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }

        self.environment.pop_scope();
        self.call_depth -= 1;
        result
    }

    /// Call a host-supplied external function through the bridge. The
    /// callable gets a fresh control handle; its recorded effects (the
    /// completion signal, fast-forwarded time, log output) are applied
    /// here, after it returns.
    pub(crate) fn call_external_function(
        &mut self,
        function: &ExternalFunction,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let Some(arity) = function.arity {
            if !arity.accepts(args.len()) {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::InvalidNumberOfArguments,
                    format!(
                        "{}() was called with {} arguments, which it does not accept",
                        function.name,
                        args.len()
                    ),
                    location,
                )
                .with_context("name", function.name.clone())
                .with_context("received", args.len().to_string()));
            }
        }

        let mut handle = ExecutionContext::new(self.time);
        let result = (function.func)(&mut handle, args);

        self.finished |= handle.finished;
        self.time += handle.fast_forwarded;
        for output in handle.logged {
            self.push_log_line(output);
        }

        match result {
            Ok(value) => Ok(value),
            Err(ExternalError::Logic(message)) => Err(RuntimeError::new(
                RuntimeErrorKind::LogicErrorInExecution,
                message,
                location,
            )),
            Err(ExternalError::Failed(message)) => Err(RuntimeError::new(
                RuntimeErrorKind::FunctionExecutionError,
                format!("{} failed: {}", function.name, message),
                location,
            )
            .with_context("name", function.name.clone())),
        }
    }

    // Shared guards.

    pub(crate) fn guard_loop_iteration(&mut self, location: SourceLocation) -> Result<(), RuntimeError> {
        self.total_loop_iterations += 1;
        if self.total_loop_iterations > self.features.max_total_loop_iterations {
            Err(RuntimeError::new(
                RuntimeErrorKind::MaxIterationsReached,
                format!(
                    "the program ran more than {} loop iterations and was stopped",
                    self.features.max_total_loop_iterations
                ),
                location,
            )
            .with_context(
                "max",
                self.features.max_total_loop_iterations.to_string(),
            ))
        } else {
            Ok(())
        }
    }

    pub(crate) fn type_error(
        &self,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> RuntimeError {
        RuntimeError::new(RuntimeErrorKind::TypeError, message, location)
    }
}
