// Loop execution: iteration ceilings, break/continue consumption, and the
// repeat-forever completion protocol.

use crate::ast::{SourceLocation, Statement};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::frame::FrameContext;
use crate::interpreter::engine::{Flow, Interpreter};
use crate::value::Value;
use crate::Language;

/// What a single loop-body pass asked the loop to do next.
enum BodyOutcome {
    Continue,
    Break,
    Propagate(Flow),
}

impl Interpreter {
    pub(crate) fn execute_loop(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        match statement {
            Statement::While {
                condition,
                body,
                location,
            } => {
                loop {
                    self.guard_loop_iteration(*location)?;
                    let condition_value = self.evaluate(condition)?;
                    let result = self.condition_bool(&condition_value, condition.location())?;
                    self.push_success_frame(
                        *location,
                        FrameContext::LoopCondition { result },
                        Some(&condition_value),
                    );
                    if !result {
                        break;
                    }
                    match self.run_loop_body(body)? {
                        BodyOutcome::Continue => {}
                        BodyOutcome::Break => break,
                        BodyOutcome::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::For {
                init,
                condition,
                update,
                body,
                location,
            } => {
                // The loop variable lives in a scope wrapping the whole loop.
                self.environment.push_scope();
                let result = self.execute_c_style_for(
                    init.as_deref(),
                    condition.as_ref(),
                    update.as_deref(),
                    body,
                    *location,
                );
                self.environment.pop_scope();
                result
            }

            Statement::ForIn {
                variable,
                iterable,
                body,
                location,
            } => {
                let target = self.evaluate(iterable)?;
                let Value::Dict(entries) = &target else {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::ForInTargetNotDictionary,
                        format!(
                            "'for…in' iterates the keys of an object, but this was a {}",
                            target.type_name(self.language)
                        ),
                        iterable.location(),
                    )
                    .with_context("type", target.type_name(self.language)));
                };

                let keys: Vec<String> = entries.borrow().keys().cloned().collect();
                for key in keys {
                    self.guard_loop_iteration(*location)?;
                    self.environment.push_scope();
                    self.environment
                        .define(variable, Value::string(key.clone()), false);
                    self.push_success_frame(
                        *location,
                        FrameContext::ForInIteration {
                            variable: variable.clone(),
                            key: key.clone(),
                        },
                        None,
                    );
                    let outcome = self.run_statements_in_current_scope(body);
                    self.environment.pop_scope();
                    match outcome? {
                        BodyOutcome::Continue => {}
                        BodyOutcome::Break => break,
                        BodyOutcome::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::Foreach {
                first,
                second,
                iterable,
                body,
                location,
            } => {
                let target = self.evaluate(iterable)?;
                let items = self.foreach_items(&target, second.is_some(), iterable.location())?;

                let mut iteration = 0u32;
                for (first_value, second_value) in items {
                    iteration += 1;
                    self.guard_loop_iteration(*location)?;
                    self.environment.push_scope();
                    self.environment.define(first, first_value, false);
                    if let (Some(name), Some(value)) = (second, second_value) {
                        self.environment.define(name, value, false);
                    }
                    self.push_success_frame(
                        *location,
                        FrameContext::ForeachIteration {
                            variable: first.clone(),
                            iteration,
                        },
                        None,
                    );
                    let outcome = self.run_statements_in_current_scope(body);
                    self.environment.pop_scope();
                    match outcome? {
                        BodyOutcome::Continue => {}
                        BodyOutcome::Break => break,
                        BodyOutcome::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::Repeat {
                count,
                body,
                location,
            } => {
                let count_value = self.evaluate(count)?;
                let Some(raw) = count_value.as_number() else {
                    return Err(self.type_error(
                        format!(
                            "the repeat count must be a number, but this was a {}",
                            count_value.type_name(self.language)
                        ),
                        count.location(),
                    ));
                };
                if raw < 0.0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::LogicErrorInExecution,
                        format!("the repeat count cannot be negative (got {})", raw),
                        count.location(),
                    ));
                }
                let total = raw as u32;
                if total > self.features.max_total_loop_iterations {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::MaxIterationsReached,
                        format!(
                            "a repeat count of {} is more than this exercise allows",
                            total
                        ),
                        count.location(),
                    ));
                }

                if total == 0 {
                    self.push_success_frame(
                        *location,
                        FrameContext::RepeatIteration {
                            iteration: 0,
                            count: 0,
                        },
                        Some(&count_value),
                    );
                    return Ok(Flow::Normal);
                }

                for iteration in 1..=total {
                    self.guard_loop_iteration(*location)?;
                    self.push_success_frame(
                        *location,
                        FrameContext::RepeatIteration {
                            iteration,
                            count: total,
                        },
                        None,
                    );
                    match self.run_loop_body(body)? {
                        BodyOutcome::Continue => {}
                        BodyOutcome::Break => break,
                        BodyOutcome::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Statement::RepeatForever { body, location } => {
                let mut iteration = 0u32;
                loop {
                    iteration += 1;
                    if iteration > self.features.max_repeat_forever_iterations {
                        return Err(RuntimeError::new(
                            RuntimeErrorKind::MaxIterationsReached,
                            format!(
                                "the loop ran {} times without the exercise finishing",
                                self.features.max_repeat_forever_iterations
                            ),
                            *location,
                        ));
                    }
                    self.guard_loop_iteration(*location)?;

                    match self.run_loop_body(body)? {
                        BodyOutcome::Continue => {}
                        BodyOutcome::Break => break,
                        BodyOutcome::Propagate(flow) => return Ok(flow),
                    }

                    // The completion signal is honored only here, at the
                    // iteration boundary: the iteration that raised it has
                    // already run all of its statements.
                    if self.finished {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }

            other => Err(RuntimeError::new(
                RuntimeErrorKind::Internal,
                format!("not a loop statement: {:?}", other.location()),
                other.location(),
            )),
        }
    }

    fn execute_c_style_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&crate::ast::Expression>,
        update: Option<&Statement>,
        body: &[Statement],
        location: SourceLocation,
    ) -> Result<Flow, RuntimeError> {
        if let Some(init) = init {
            match self.execute_statement(init)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        loop {
            self.guard_loop_iteration(location)?;

            if let Some(condition) = condition {
                let condition_value = self.evaluate(condition)?;
                let result = self.condition_bool(&condition_value, condition.location())?;
                self.push_success_frame(
                    location,
                    FrameContext::LoopCondition { result },
                    Some(&condition_value),
                );
                if !result {
                    break;
                }
            }

            match self.run_loop_body(body)? {
                BodyOutcome::Propagate(flow) => return Ok(flow),
                BodyOutcome::Break => break,
                // `continue` (and normal completion) still runs the
                // update expression before the condition is re-tested.
                BodyOutcome::Continue => {
                    if let Some(update) = update {
                        match self.execute_statement(update)? {
                            Flow::Normal => {}
                            flow => return Ok(flow),
                        }
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a loop body in a child scope, consuming break/continue and
    /// propagating return.
    fn run_loop_body(&mut self, body: &[Statement]) -> Result<BodyOutcome, RuntimeError> {
        match self.execute_block(body)? {
            Flow::Normal | Flow::Continue(_) => Ok(BodyOutcome::Continue),
            Flow::Break(_) => Ok(BodyOutcome::Break),
            flow @ Flow::Return(..) => Ok(BodyOutcome::Propagate(flow)),
        }
    }

    /// Same consumption rules, but without opening another scope (the loop
    /// already created one for its iteration variables).
    fn run_statements_in_current_scope(
        &mut self,
        body: &[Statement],
    ) -> Result<BodyOutcome, RuntimeError> {
        for statement in body {
            match self.execute_statement(statement)? {
                Flow::Normal => {}
                Flow::Continue(_) => return Ok(BodyOutcome::Continue),
                Flow::Break(_) => return Ok(BodyOutcome::Break),
                flow @ Flow::Return(..) => return Ok(BodyOutcome::Propagate(flow)),
            }
        }
        Ok(BodyOutcome::Continue)
    }

    /// The (first, second) bindings each iteration of a for-each produces.
    fn foreach_items(
        &self,
        target: &Value,
        wants_pairs: bool,
        location: SourceLocation,
    ) -> Result<Vec<(Value, Option<Value>)>, RuntimeError> {
        match target {
            Value::List(elements) => {
                if wants_pairs {
                    return Err(self.type_error(
                        "a list produces one value per iteration, not two",
                        location,
                    ));
                }
                Ok(elements
                    .borrow()
                    .iter()
                    .map(|v| (v.clone(), None))
                    .collect())
            }
            Value::Str(s) => {
                if wants_pairs {
                    return Err(self.type_error(
                        "a string produces one character per iteration, not two",
                        location,
                    ));
                }
                Ok(s.chars()
                    .map(|c| (Value::string(c.to_string()), None))
                    .collect())
            }
            Value::Dict(entries) => {
                if wants_pairs {
                    Ok(entries
                        .borrow()
                        .iter()
                        .map(|(k, v)| (Value::string(k.clone()), Some(v.clone())))
                        .collect())
                } else if self.language == Language::Python {
                    // Python iterates dictionary keys.
                    Ok(entries
                        .borrow()
                        .keys()
                        .map(|k| (Value::string(k.clone()), None))
                        .collect())
                } else {
                    Err(self.type_error(
                        "iterating a dictionary needs two names: one for the key and one for the value",
                        location,
                    ))
                }
            }
            other => Err(RuntimeError::new(
                RuntimeErrorKind::TargetNotIterable,
                format!("a {} cannot be iterated", other.type_name(self.language)),
                location,
            )
            .with_context("type", other.type_name(self.language))),
        }
    }
}
