// Expression evaluation.

use crate::ast::{BinaryOp, Expression, LogicalOp, SourceLocation, UnaryOp};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::interpreter::engine::Interpreter;
use crate::stdlib;
use crate::value::Value;
use crate::Language;
use std::collections::BTreeMap;

impl Interpreter {
    pub(crate) fn evaluate(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::NumberLiteral { value, .. } => Ok(Value::Number(*value)),
            Expression::StringLiteral { value, .. } => Ok(Value::string(value.clone())),
            Expression::BoolLiteral { value, .. } => Ok(Value::Bool(*value)),
            Expression::NoneLiteral { .. } => Ok(Value::None),

            Expression::ListLiteral { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Value::list(values))
            }

            Expression::DictLiteral { entries, .. } => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.evaluate(value)?);
                }
                Ok(Value::dict(map))
            }

            Expression::Variable { name, location } => self.lookup_variable(name, *location),

            Expression::Grouping { inner, .. } => self.evaluate(inner),

            Expression::Unary {
                op,
                operand,
                location,
            } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Neg => match value.as_number() {
                        Some(n) => Ok(Value::Number(-n)),
                        None => Err(self.type_error(
                            format!(
                                "cannot negate a {}",
                                value.type_name(self.language)
                            ),
                            *location,
                        )),
                    },
                    UnaryOp::Not => {
                        let b = self.condition_bool(&value, *location)?;
                        Ok(Value::Bool(!b))
                    }
                }
            }

            Expression::Binary {
                op,
                left,
                right,
                location,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary_op(*op, &left, &right, *location)
            }

            Expression::Logical {
                op,
                left,
                right,
                location,
            } => {
                let left_value = self.evaluate(left)?;
                let left_bool = self.condition_bool(&left_value, *location)?;
                match op {
                    LogicalOp::And => {
                        if !left_bool {
                            return Ok(Value::Bool(false));
                        }
                        let right_value = self.evaluate(right)?;
                        Ok(Value::Bool(self.condition_bool(&right_value, *location)?))
                    }
                    LogicalOp::Or => {
                        if left_bool {
                            return Ok(Value::Bool(true));
                        }
                        let right_value = self.evaluate(right)?;
                        Ok(Value::Bool(self.condition_bool(&right_value, *location)?))
                    }
                }
            }

            Expression::Call {
                name,
                args,
                location,
            } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.call_function(name, &values, *location)
            }

            Expression::MethodCall {
                object,
                member,
                args,
                location,
            } => {
                // `random.randint(...)` resolves to the randomness service
                // in Python programs, unless the learner shadowed `random`.
                if self.is_random_module(object) {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.evaluate(arg)?);
                    }
                    return self.call_random_module(member, &values, *location);
                }

                let receiver = self.evaluate(object)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                stdlib::call_method(
                    self.language,
                    &receiver,
                    member,
                    &values,
                    &self.features,
                    *location,
                )
            }

            Expression::MemberAccess {
                object,
                member,
                location,
            } => {
                let receiver = self.evaluate(object)?;
                // JavaScript object property reads are dictionary lookups,
                // not stdlib members; a missing key reads as null.
                if self.language == Language::JavaScript {
                    if let Value::Dict(entries) = &receiver {
                        return Ok(entries
                            .borrow()
                            .get(member)
                            .cloned()
                            .unwrap_or(Value::None));
                    }
                }
                stdlib::get_property(self.language, &receiver, member, &self.features, *location)
            }

            Expression::Index {
                object,
                index,
                location,
            } => {
                let receiver = self.evaluate(object)?;
                let index_value = self.evaluate(index)?;
                self.read_element(&receiver, &index_value, *location)
            }
        }
    }

    pub(crate) fn binary_op(
        &self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),

            BinaryOp::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => {
                    let mut result = a.clone();
                    result.push_str(b);
                    Ok(Value::string(result))
                }
                _ => Err(self.operand_type_error("+", left, right, location)),
            },

            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
                    return Err(self.operand_type_error(op_symbol(op), left, right, location));
                };
                match op {
                    BinaryOp::Sub => Ok(Value::Number(a - b)),
                    BinaryOp::Mul => Ok(Value::Number(a * b)),
                    BinaryOp::Div => {
                        if b == 0.0 {
                            Err(RuntimeError::new(
                                RuntimeErrorKind::LogicErrorInExecution,
                                "cannot divide by zero",
                                location,
                            ))
                        } else {
                            Ok(Value::Number(a / b))
                        }
                    }
                    BinaryOp::Mod => {
                        if b == 0.0 {
                            Err(RuntimeError::new(
                                RuntimeErrorKind::LogicErrorInExecution,
                                "cannot take the remainder of a division by zero",
                                location,
                            ))
                        } else if self.language == Language::Python {
                            // Python's % takes the sign of the divisor.
                            Ok(Value::Number(a.rem_euclid(b)))
                        } else {
                            Ok(Value::Number(a % b))
                        }
                    }
                    _ => unreachable!(),
                }
            }

            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                match (left, right) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Le => a <= b,
                        BinaryOp::Gt => a > b,
                        _ => a >= b,
                    })),
                    (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Le => a <= b,
                        BinaryOp::Gt => a > b,
                        _ => a >= b,
                    })),
                    _ => Err(self.operand_type_error(op_symbol(op), left, right, location)),
                }
            }
        }
    }

    /// Free function call resolution: user-defined functions first, then
    /// host-injected externals, then the stdlib (subject to its
    /// allow-list).
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if self.functions.contains_key(name) {
            return self.call_user_function(name, args, location);
        }

        if let Some(external) = self.externals.get(name).cloned() {
            return self.call_external_function(&external, args, location);
        }

        if stdlib::functions::is_stdlib_function(self.language, name) {
            if let Some(allowed) = &self.features.allowed_stdlib_functions {
                if !allowed.iter().any(|f| f == name) {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::MethodNotYetAvailable,
                        format!(
                            "'{}' exists, but it is not available in this exercise yet",
                            name
                        ),
                        location,
                    )
                    .with_context("function", name.to_string()));
                }
            }
            return stdlib::functions::call(self.language, name, args, &mut self.rng, location);
        }

        Err(RuntimeError::new(
            RuntimeErrorKind::FunctionNotFound,
            format!("there is no function called '{}'", name),
            location,
        )
        .with_context("name", name.to_string()))
    }

    fn is_random_module(&self, object: &Expression) -> bool {
        self.language == Language::Python
            && matches!(object, Expression::Variable { name, .. }
                if name == "random" && !self.environment.is_declared("random"))
    }

    fn call_random_module(
        &mut self,
        member: &str,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match member {
            "randint" => {
                stdlib::guard_exact_args("randint", args, 2, location)?;
                let min = args[0].as_number().ok_or_else(|| {
                    self.type_error("randint(): arguments must be numbers", location)
                })?;
                let max = args[1].as_number().ok_or_else(|| {
                    self.type_error("randint(): arguments must be numbers", location)
                })?;
                stdlib::functions::random_int(
                    &mut self.rng,
                    min as i64,
                    max as i64,
                    location,
                )
            }
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::PropertyNotFound,
                format!("the random module has no function called '{}'", member),
                location,
            )
            .with_context("member", member.to_string())),
        }
    }

    /// Read `receiver[index]` with the front-end's indexing rules.
    fn read_element(
        &self,
        receiver: &Value,
        index: &Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::List(elements) => {
                let position = self.list_index(elements.borrow().len(), index, location)?;
                Ok(elements.borrow()[position].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let position = self.list_index(chars.len(), index, location)?;
                Ok(Value::string(chars[position].to_string()))
            }
            Value::Dict(entries) => {
                let Some(key) = index.as_str() else {
                    // Bracket access with a non-string key is also how a
                    // learner might reach for `items["length"]`-style
                    // stdlib members; both are type errors here.
                    return Err(self.type_error(
                        format!(
                            "dictionary keys are strings, not {}",
                            index.type_name(self.language)
                        ),
                        location,
                    ));
                };
                match entries.borrow().get(key) {
                    Some(value) => Ok(value.clone()),
                    None => match self.language {
                        Language::JavaScript => Ok(Value::None),
                        _ => Err(RuntimeError::new(
                            RuntimeErrorKind::KeyNotFound,
                            format!("the dictionary has no key \"{}\"", key),
                            location,
                        )
                        .with_context("key", key.to_string())),
                    },
                }
            }
            other => Err(self.type_error(
                format!("a {} cannot be indexed", other.type_name(self.language)),
                location,
            )),
        }
    }

    fn operand_type_error(
        &self,
        op: &str,
        left: &Value,
        right: &Value,
        location: SourceLocation,
    ) -> RuntimeError {
        self.type_error(
            format!(
                "'{}' cannot be used between a {} and a {}",
                op,
                left.type_name(self.language),
                right.type_name(self.language)
            ),
            location,
        )
    }
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
    }
}
