//! Error types for cyprog-core
//!
//! This is the common error vocabulary shared by the adapter and flash
//! crates. Backend crates define richer error enums of their own and map
//! into these variants at the trait boundary.

use core::fmt;

/// Core error type - Copy for cheap propagation through the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A USB/HID transfer moved no data or failed outright
    TransportFailure,
    /// The adapter answered a control command with something other than ACK
    ProtocolNack,
    /// The operation requires a halted target
    TargetNotHalted,
    /// Response byte count is inconsistent with the queued requests
    QueueDesync,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFailure => write!(f, "USB transfer failed"),
            Self::ProtocolNack => write!(f, "adapter did not respond OK"),
            Self::TargetNotHalted => write!(f, "target not halted"),
            Self::QueueDesync => write!(f, "transaction queue desynchronized from response"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
