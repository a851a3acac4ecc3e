//! crates/study_spark_core/src/lane.rs
//!
//! Per-feature request state. Each workflow feature owns one lane; a
//! lane is a single discriminated value instead of a pair of loading
//! and result flags.

use crate::ports::WorkflowError;

/// The independent features of the workflow. Each has its own lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Extraction,
    StudyAid,
    MindMapImage,
    Explanation,
    Examples,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Extraction => "extraction",
            Feature::StudyAid => "study_aid",
            Feature::MindMapImage => "mind_map_image",
            Feature::Explanation => "explanation",
            Feature::Examples => "examples",
        }
    }
}

/// The request/result state of one feature lane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LaneState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(WorkflowError),
}

impl<T> LaneState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, LaneState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LaneState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            LaneState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        match self {
            LaneState::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            LaneState::Idle => "idle",
            LaneState::Loading => "loading",
            LaneState::Success(_) => "success",
            LaneState::Error(_) => "error",
        }
    }
}
