use thiserror::Error;

/// The caller-visible error taxonomy of the scheduling and timing
/// engines. Every use-case error enum converts into one of these.
#[derive(Error, Debug, PartialEq)]
pub enum NudgeError {
    #[error("Scheduled time {0} is in the past")]
    InvalidScheduleTime(i64),
    #[error("There was a conflict with the request. Error message: `{0}`")]
    ScheduleConflict(String),
    #[error("Not enough history to analyze: {points} interactions, {required} required")]
    InsufficientData { points: usize, required: usize },
    #[error("Timing model prediction failed. Error message: `{0}`")]
    ModelPrediction(String),
    #[error("404 Not found. Error message: `{0}`")]
    NotFound(String),
    #[error("Internal server error")]
    Internal,
}
