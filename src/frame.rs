//! Execution frames: the replayable trace.
//!
//! One [`Frame`] is recorded per executed statement (and per loop
//! iteration boundary). A frame owns deep-cloned snapshot data only -
//! never a live reference into interpreter state - so scrubbing backward
//! through history always shows exactly what was true at that moment,
//! regardless of what the program mutated later.

use crate::ast::SourceLocation;
use crate::describe;
use crate::error::RuntimeError;
use crate::value::Value;
use crate::Language;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "ERROR")]
    Error,
}

/// What kind of construct produced a frame, with the snapshot data its
/// description needs. All payloads are plain owned data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "nodeType")]
pub enum FrameContext {
    VariableDeclaration { name: String },
    Assignment { name: String },
    CompoundAssignment { name: String },
    IncDec { name: String, increment: bool },
    ElementAssignment { index: String },
    MemberAssignment { member: String },
    Expression,
    FunctionCall { name: String },
    Log { output: String },
    If { condition_result: bool },
    LoopCondition { result: bool },
    RepeatIteration { iteration: u32, count: u32 },
    ForeachIteration { variable: String, iteration: u32 },
    ForInIteration { variable: String, key: String },
    Return { has_value: bool },
    Break,
    Continue,
    Error,
}

/// One recorded step of program execution.
///
/// `time` is a monotonically increasing logical unit, not wall-clock time.
/// `result` and every entry of `variables` are deep clones: mutating the
/// live program after this frame was captured cannot change them.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub time: u64,
    pub line: usize,
    pub status: FrameStatus,
    pub result: Option<Value>,
    pub variables: BTreeMap<String, Value>,
    pub context: FrameContext,
    pub error: Option<RuntimeError>,
    #[serde(skip)]
    pub language: Language,
}

impl Frame {
    pub fn success(
        time: u64,
        location: SourceLocation,
        result: Option<Value>,
        variables: BTreeMap<String, Value>,
        context: FrameContext,
        language: Language,
    ) -> Self {
        Frame {
            time,
            line: location.line,
            status: FrameStatus::Success,
            result,
            variables,
            context,
            error: None,
            language,
        }
    }

    pub fn error(
        time: u64,
        location: SourceLocation,
        variables: BTreeMap<String, Value>,
        error: RuntimeError,
        language: Language,
    ) -> Self {
        Frame {
            time,
            line: location.line,
            status: FrameStatus::Error,
            result: None,
            variables,
            context: FrameContext::Error,
            error: Some(error),
            language,
        }
    }

    /// Human-readable explanation of this step, computed on demand as a
    /// pure function of the frame's own snapshot data.
    pub fn description(&self) -> String {
        describe::describe_frame(self)
    }
}

/// Output produced by an explicit log/print construct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub time: u64,
    pub output: String,
}
