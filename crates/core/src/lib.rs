mod error;

pub mod engagement;
pub mod job_schedulers;
pub mod scheduling;
pub mod shared;
pub mod timing;

pub use error::NudgeError;
