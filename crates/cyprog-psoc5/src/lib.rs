//! PSoC 5LP flash driver
//!
//! Flash on the PSoC 5LP is programmed through the System Performance
//! Controller (SPC), a mailbox style peripheral fed one byte at a time
//! through a CPU data register. This crate drives the SPC over any
//! [`cyprog_core::TargetMemory`] implementation, so it works the same
//! against real hardware and against the in-memory fakes in the tests.

pub mod chips;
pub mod driver;
pub mod error;
pub mod spc;

pub use chips::{details_by_id, ChipDetails, Protection};
pub use driver::Psoc5Flash;
pub use error::{Psoc5Error, Result};
