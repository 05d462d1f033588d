//! Frame descriptions: the "explain this step" strings shown in the
//! timeline UI.
//!
//! Descriptions are generated from a frame's already-cloned snapshot data,
//! never from live interpreter state, so they can be produced at any point
//! after the run without re-execution.

use crate::frame::{Frame, FrameContext, FrameStatus};

pub fn describe_frame(frame: &Frame) -> String {
    if frame.status == FrameStatus::Error {
        return match &frame.error {
            Some(error) => format!("This line caused an error: {}", error.message),
            None => "This line caused an error.".to_string(),
        };
    }

    let result = |frame: &Frame| -> String {
        frame
            .result
            .as_ref()
            .map(|v| v.format(frame.language))
            .unwrap_or_else(|| "nothing".to_string())
    };

    match &frame.context {
        FrameContext::VariableDeclaration { name } => {
            format!(
                "Declared the variable `{}` and set it to `{}`.",
                name,
                variable_display(frame, name)
            )
        }
        FrameContext::Assignment { name } => {
            format!(
                "Changed the variable `{}` to `{}`.",
                name,
                variable_display(frame, name)
            )
        }
        FrameContext::CompoundAssignment { name } => {
            format!(
                "Updated the variable `{}`; it is now `{}`.",
                name,
                variable_display(frame, name)
            )
        }
        FrameContext::IncDec { name, increment } => {
            let verb = if *increment { "Incremented" } else { "Decremented" };
            format!(
                "{} the variable `{}`; it is now `{}`.",
                verb,
                name,
                variable_display(frame, name)
            )
        }
        FrameContext::ElementAssignment { index } => {
            format!("Changed the element at `{}` to `{}`.", index, result(frame))
        }
        FrameContext::MemberAssignment { member } => {
            format!("Set the `{}` entry to `{}`.", member, result(frame))
        }
        FrameContext::Expression => {
            format!("Evaluated this expression, giving `{}`.", result(frame))
        }
        FrameContext::FunctionCall { name } => match &frame.result {
            Some(value) => format!(
                "Called `{}`, which returned `{}`.",
                name,
                value.format(frame.language)
            ),
            None => format!("Called `{}`.", name),
        },
        FrameContext::Log { output } => {
            format!("Logged `{}`.", output)
        }
        FrameContext::If { condition_result } => {
            if *condition_result {
                "The condition was true, so this branch ran.".to_string()
            } else {
                "The condition was false, so this branch was skipped.".to_string()
            }
        }
        FrameContext::LoopCondition { result } => {
            if *result {
                "The loop condition was true, so the loop ran another time.".to_string()
            } else {
                "The loop condition was false, so the loop finished.".to_string()
            }
        }
        FrameContext::RepeatIteration { iteration, count } => {
            format!("Started iteration {} of {}.", iteration, count)
        }
        FrameContext::ForeachIteration { variable, iteration } => {
            format!(
                "Iteration {}: set `{}` to `{}`.",
                iteration,
                variable,
                variable_display(frame, variable)
            )
        }
        FrameContext::ForInIteration { variable, key } => {
            format!("Set `{}` to the key `\"{}\"`.", variable, key)
        }
        FrameContext::Return { has_value } => {
            if *has_value {
                format!("Returned `{}` from the function.", result(frame))
            } else {
                "Returned from the function.".to_string()
            }
        }
        FrameContext::Break => "Broke out of the enclosing loop.".to_string(),
        FrameContext::Continue => "Skipped to the next loop iteration.".to_string(),
        FrameContext::Error => "This line caused an error.".to_string(),
    }
}

fn variable_display(frame: &Frame, name: &str) -> String {
    frame
        .variables
        .get(name)
        .or(frame.result.as_ref())
        .map(|v| v.format(frame.language))
        .unwrap_or_else(|| "nothing".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;
    use crate::value::Value;
    use crate::Language;
    use std::collections::BTreeMap;

    #[test]
    fn test_describe_declaration() {
        let mut variables = BTreeMap::new();
        variables.insert("x".to_string(), Value::Number(42.0));
        let frame = Frame::success(
            0,
            SourceLocation::new(1, 1),
            Some(Value::Number(42.0)),
            variables,
            FrameContext::VariableDeclaration {
                name: "x".to_string(),
            },
            Language::JavaScript,
        );
        assert_eq!(
            frame.description(),
            "Declared the variable `x` and set it to `42`."
        );
    }

    #[test]
    fn test_describe_error_frame() {
        let frame = Frame::error(
            3,
            SourceLocation::new(2, 1),
            BTreeMap::new(),
            crate::error::RuntimeError::new(
                crate::error::RuntimeErrorKind::VariableNotDeclared,
                "the variable `y` has not been declared",
                SourceLocation::new(2, 1),
            ),
            Language::JavaScript,
        );
        assert_eq!(
            frame.description(),
            "This line caused an error: the variable `y` has not been declared"
        );
    }
}
