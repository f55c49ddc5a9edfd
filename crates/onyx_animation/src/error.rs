//! Animation error types

use crate::timeline::TimelineState;
use thiserror::Error;

/// Errors raised by timelines, actors and the scheduler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A timeline was built with a zero duration
    #[error("Timeline duration must be greater than zero")]
    InvalidDuration,

    /// The timeline already holds a scheduler registration
    #[error("Timeline is already registered with the scheduler")]
    DoubleRegistration,

    /// Replay of a terminal timeline without `reset()`
    #[error("Cannot replay a {0:?} timeline without reset")]
    PostTerminalMutation(TimelineState),

    /// Off-thread actor work failed (I/O, decode, or a panic)
    #[error("Actor work failed: {0}")]
    FetchFailure(String),

    /// The scheduler behind a handle has been dropped
    #[error("Animation scheduler is no longer running")]
    SchedulerGone,

    /// Spline tension outside (0, 1)
    #[error("Spline tension must be in (0, 1), got {0}")]
    InvalidTension(f32),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
