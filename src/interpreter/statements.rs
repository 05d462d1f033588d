// Statement execution.

use crate::ast::{Expression, SourceLocation, Statement};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::frame::FrameContext;
use crate::interpreter::engine::{Flow, FunctionDef, Interpreter};
use crate::interpreter::environment::AssignOutcome;
use crate::value::Value;
use crate::Language;

impl Interpreter {
    pub(crate) fn execute_statement(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        match statement {
            Statement::VarDeclaration {
                name,
                constant,
                initializer,
                location,
            } => {
                let value = self.evaluate(initializer)?;
                if !self.environment.define(name, value.clone(), *constant) {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::VariableAlreadyDeclared,
                        format!("the variable '{}' has already been declared", name),
                        *location,
                    )
                    .with_context("name", name.clone()));
                }
                self.push_success_frame(
                    *location,
                    FrameContext::VariableDeclaration { name: name.clone() },
                    Some(&value),
                );
                Ok(Flow::Normal)
            }

            Statement::Assignment {
                name,
                value,
                location,
            } => {
                let value = self.evaluate(value)?;

                // Python has no declaration keyword: the first binding of a
                // name is its declaration.
                if self.language == Language::Python {
                    let created = self.environment.define_or_assign(name, value.clone());
                    let context = if created {
                        FrameContext::VariableDeclaration { name: name.clone() }
                    } else {
                        FrameContext::Assignment { name: name.clone() }
                    };
                    self.push_success_frame(*location, context, Some(&value));
                    return Ok(Flow::Normal);
                }

                self.assign_checked(name, value.clone(), *location)?;
                self.push_success_frame(
                    *location,
                    FrameContext::Assignment { name: name.clone() },
                    Some(&value),
                );
                Ok(Flow::Normal)
            }

            Statement::CompoundAssignment {
                name,
                op,
                value,
                location,
            } => {
                let current = self.lookup_variable(name, *location)?;
                let rhs = self.evaluate(value)?;
                let updated = self.binary_op(*op, &current, &rhs, *location)?;
                self.assign_checked(name, updated.clone(), *location)?;
                self.push_success_frame(
                    *location,
                    FrameContext::CompoundAssignment { name: name.clone() },
                    Some(&updated),
                );
                Ok(Flow::Normal)
            }

            Statement::IncDec {
                name,
                increment,
                location,
            } => {
                let current = self.lookup_variable(name, *location)?;
                let Some(n) = current.as_number() else {
                    return Err(self.type_error(
                        format!(
                            "'{}' is a {}, so it cannot be {}",
                            name,
                            current.type_name(self.language),
                            if *increment { "incremented" } else { "decremented" }
                        ),
                        *location,
                    ));
                };
                let updated = Value::Number(if *increment { n + 1.0 } else { n - 1.0 });
                self.assign_checked(name, updated.clone(), *location)?;
                self.push_success_frame(
                    *location,
                    FrameContext::IncDec {
                        name: name.clone(),
                        increment: *increment,
                    },
                    Some(&updated),
                );
                Ok(Flow::Normal)
            }

            Statement::ElementAssignment {
                object,
                index,
                value,
                location,
            } => {
                let target = self.evaluate(object)?;
                let index_value = self.evaluate(index)?;
                let new_value = self.evaluate(value)?;
                let index_display =
                    self.store_element(&target, &index_value, new_value.clone(), *location)?;
                self.push_success_frame(
                    *location,
                    FrameContext::ElementAssignment {
                        index: index_display,
                    },
                    Some(&new_value),
                );
                Ok(Flow::Normal)
            }

            Statement::MemberAssignment {
                object,
                member,
                value,
                location,
            } => {
                let target = self.evaluate(object)?;
                let Value::Dict(entries) = &target else {
                    return Err(self.type_error(
                        format!(
                            "cannot set '{}' on a {}",
                            member,
                            target.type_name(self.language)
                        ),
                        *location,
                    ));
                };
                let new_value = self.evaluate(value)?;
                entries.borrow_mut().insert(member.clone(), new_value.clone());
                self.push_success_frame(
                    *location,
                    FrameContext::MemberAssignment {
                        member: member.clone(),
                    },
                    Some(&new_value),
                );
                Ok(Flow::Normal)
            }

            Statement::Expression {
                expression,
                location,
            } => {
                let value = self.evaluate(expression)?;
                let context = match expression {
                    Expression::Call { name, .. } => FrameContext::FunctionCall { name: name.clone() },
                    Expression::MethodCall { member, .. } => FrameContext::FunctionCall {
                        name: member.clone(),
                    },
                    _ => FrameContext::Expression,
                };
                self.push_success_frame(*location, context, Some(&value));
                Ok(Flow::Normal)
            }

            Statement::Log {
                expression,
                location,
            } => {
                let value = self.evaluate(expression)?;
                let output = value.format(self.language);
                self.push_log_line(output.clone());
                self.push_success_frame(*location, FrameContext::Log { output }, Some(&value));
                Ok(Flow::Normal)
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
                location,
            } => {
                let condition_value = self.evaluate(condition)?;
                let result = self.condition_bool(&condition_value, condition.location())?;
                self.push_success_frame(
                    *location,
                    FrameContext::If {
                        condition_result: result,
                    },
                    Some(&condition_value),
                );

                if result {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Statement::While { .. }
            | Statement::For { .. }
            | Statement::ForIn { .. }
            | Statement::Foreach { .. }
            | Statement::Repeat { .. }
            | Statement::RepeatForever { .. } => self.execute_loop(statement),

            Statement::Break { location } => {
                self.push_success_frame(*location, FrameContext::Break, None);
                Ok(Flow::Break(*location))
            }

            Statement::Continue { location } => {
                self.push_success_frame(*location, FrameContext::Continue, None);
                Ok(Flow::Continue(*location))
            }

            Statement::Return { value, location } => {
                let result = match value {
                    Some(expression) => Some(self.evaluate(expression)?),
                    None => None,
                };
                self.push_success_frame(
                    *location,
                    FrameContext::Return {
                        has_value: result.is_some(),
                    },
                    result.as_ref(),
                );
                Ok(Flow::Return(result, *location))
            }

            Statement::FunctionDeclaration {
                name,
                params,
                body,
                location,
            } => {
                self.functions.insert(
                    name.clone(),
                    FunctionDef {
                        name: name.clone(),
                        params: params.clone(),
                        body: body.clone(),
                        location: *location,
                    },
                );
                Ok(Flow::Normal)
            }

            Statement::Block { body, .. } => self.execute_block(body),
        }
    }

    /// Execute statements in a fresh child scope, propagating any control
    /// flow signal to the caller.
    pub(crate) fn execute_block(&mut self, statements: &[Statement]) -> Result<Flow, RuntimeError> {
        self.environment.push_scope();
        let mut flow = Flow::Normal;
        for statement in statements {
            match self.execute_statement(statement) {
                Ok(Flow::Normal) => {}
                Ok(other) => {
                    flow = other;
                    break;
                }
                Err(error) => {
                    self.environment.pop_scope();
                    return Err(error);
                }
            }
        }
        self.environment.pop_scope();
        Ok(flow)
    }

    pub(crate) fn lookup_variable(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        self.environment.get(name).cloned().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::VariableNotDeclared,
                format!("the variable '{}' has not been declared", name),
                location,
            )
            .with_context("name", name.to_string())
        })
    }

    fn assign_checked(
        &mut self,
        name: &str,
        value: Value,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match self.environment.assign(name, value) {
            AssignOutcome::Assigned => Ok(()),
            AssignOutcome::NotDeclared => Err(RuntimeError::new(
                RuntimeErrorKind::VariableNotDeclared,
                format!("the variable '{}' has not been declared", name),
                location,
            )
            .with_context("name", name.to_string())),
            AssignOutcome::Constant => Err(RuntimeError::new(
                RuntimeErrorKind::AssignmentToConstant,
                format!("'{}' is a constant, so it cannot be changed", name),
                location,
            )
            .with_context("name", name.to_string())),
        }
    }

    /// Write `value` into `target[index]`, returning the display form of
    /// the index for the frame context.
    fn store_element(
        &mut self,
        target: &Value,
        index: &Value,
        value: Value,
        location: SourceLocation,
    ) -> Result<String, RuntimeError> {
        match target {
            Value::List(elements) => {
                let position = self.list_index(elements.borrow().len(), index, location)?;
                elements.borrow_mut()[position] = value;
                Ok(index.format(self.language))
            }
            Value::Dict(entries) => {
                let Some(key) = index.as_str() else {
                    return Err(self.type_error(
                        format!(
                            "dictionary keys are strings, not {}",
                            index.type_name(self.language)
                        ),
                        location,
                    ));
                };
                entries.borrow_mut().insert(key.to_string(), value);
                Ok(format!("\"{}\"", key))
            }
            other => Err(self.type_error(
                format!(
                    "cannot change an element of a {}",
                    other.type_name(self.language)
                ),
                location,
            )),
        }
    }

    /// Resolve a raw index value to a vector position, applying the
    /// front-end's indexing rules (lesson is 1-based; Python allows
    /// negative indices).
    pub(crate) fn list_index(
        &self,
        length: usize,
        index: &Value,
        location: SourceLocation,
    ) -> Result<usize, RuntimeError> {
        let Some(raw) = index.as_number() else {
            return Err(self.type_error(
                format!(
                    "indexes are numbers, not {}",
                    index.type_name(self.language)
                ),
                location,
            ));
        };
        if raw.fract() != 0.0 {
            return Err(self.type_error(
                format!("indexes must be whole numbers, not {}", raw),
                location,
            ));
        }
        let raw = raw as i64;

        let position = match self.language {
            Language::Lesson => {
                if raw < 1 || raw as usize > length {
                    return Err(self.index_out_of_bounds(raw, length, location));
                }
                (raw - 1) as usize
            }
            Language::Python => {
                let adjusted = if raw < 0 { length as i64 + raw } else { raw };
                if adjusted < 0 || adjusted as usize >= length {
                    return Err(self.index_out_of_bounds(raw, length, location));
                }
                adjusted as usize
            }
            Language::JavaScript => {
                if raw < 0 || raw as usize >= length {
                    return Err(self.index_out_of_bounds(raw, length, location));
                }
                raw as usize
            }
        };
        Ok(position)
    }

    fn index_out_of_bounds(
        &self,
        index: i64,
        length: usize,
        location: SourceLocation,
    ) -> RuntimeError {
        RuntimeError::new(
            RuntimeErrorKind::IndexOutOfBounds,
            format!(
                "index {} is out of range for a length of {}",
                index, length
            ),
            location,
        )
        .with_context("index", index.to_string())
        .with_context("length", length.to_string())
    }

    /// Conditions: the lesson language insists on a real boolean; the
    /// JavaScript and Python front-ends follow their host truthiness.
    pub(crate) fn condition_bool(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        match self.language {
            Language::Lesson => value.as_bool().ok_or_else(|| {
                self.type_error(
                    format!(
                        "conditions must be true or false, but this was a {}",
                        value.type_name(self.language)
                    ),
                    location,
                )
            }),
            _ => Ok(value.is_truthy(self.language)),
        }
    }
}
