//! Error types for the KitProg backend

use thiserror::Error;

/// Result type for KitProg operations
pub type Result<T> = std::result::Result<T, KitProgError>;

/// Errors that can occur when using a KitProg adapter
#[derive(Debug, Error)]
pub enum KitProgError {
    #[error("KitProg device not found (VID:04B4 PID:F139)")]
    DeviceNotFound,

    #[error("Failed to open KitProg: {0}")]
    OpenFailed(String),

    #[error("Failed to claim programmer interface: {0}")]
    ClaimFailed(String),

    #[error("Failed to open KitBridge (HID) interface: {0}")]
    HidOpenFailed(String),

    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    #[error("Zero bytes transferred")]
    NoResponse,

    #[error("Programmer did not respond OK")]
    Nack,

    #[error("No PSoC devices found")]
    NoTargetFound,

    #[error(transparent)]
    Core(#[from] cyprog_core::Error),
}

impl From<nusb::Error> for KitProgError {
    fn from(e: nusb::Error) -> Self {
        KitProgError::TransferFailed(e.to_string())
    }
}

impl From<hidapi::HidError> for KitProgError {
    fn from(e: hidapi::HidError) -> Self {
        KitProgError::TransferFailed(e.to_string())
    }
}
