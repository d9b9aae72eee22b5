use thiserror::Error;

use super::class::ClassId;

/// Errors surfaced by the scheduler's registration and subscription calls.
///
/// The per-frame `tick` path never produces these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    /// The class token was never registered with this scheduler, or was
    /// unregistered since.
    #[error("event class {0} is not registered with this scheduler")]
    UnregisteredClass(ClassId),

    /// Timeout delays must be finite and non-negative.
    #[error("invalid timeout delay {0}s: must be finite and >= 0")]
    InvalidDelay(f64),

    /// Window intervals must be finite and non-negative.
    #[error("invalid window interval {0}s: must be finite and >= 0")]
    InvalidInterval(f64),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
