//! Error types for the PSoC 5LP flash driver

use std::time::Duration;

use thiserror::Error;

/// Result type for PSoC 5LP flash operations
pub type Result<T> = std::result::Result<T, Psoc5Error>;

/// Errors that can occur while driving the PSoC 5LP flash controller
#[derive(Debug, Error)]
pub enum Psoc5Error {
    #[error("Target not halted")]
    TargetNotHalted,

    #[error("Flash bank not probed")]
    NotProbed,

    #[error("Derived flash geometry has zero rows")]
    GeometryInconsistent,

    #[error("SPC did not return to idle within {0:?}")]
    SpcTimeout(Duration),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Core(#[from] cyprog_core::Error),
}
