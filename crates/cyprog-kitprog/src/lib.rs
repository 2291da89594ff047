//! Cypress KitProg debug adapter backend
//!
//! The KitProg is the onboard programmer found on PSoC development kits.
//! It exposes two USB faces: a vendor bulk interface that carries SWD
//! transactions and programmer control commands, and a HID interface
//! ("KitBridge") used for housekeeping such as firmware version and
//! target voltage queries.
//!
//! SWD register accesses are queued in host memory and shipped to the
//! firmware in batches, so callers see the queue/flush model described
//! by [`cyprog_core::SwdProbe`].

pub mod device;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod transport;

pub use device::{KitProg, KitProgInfo};
pub use error::{KitProgError, Result};
pub use transport::{Transport, UsbTransport};
