//! cyprog-core - shared vocabulary for the cyprog programmer tool
//!
//! This crate holds everything the adapter and flash crates agree on:
//! the error taxonomy, the SWD request header encoding, the `SwdProbe`
//! capability trait implemented by debug adapters, the ADIv5 debug-port
//! and MEM-AP plumbing that turns raw SWD register accesses into target
//! memory accesses, and the flash sector bookkeeping types.

pub mod bank;
pub mod dap;
pub mod error;
pub mod swd;
pub mod target;

pub use bank::FlashSector;
pub use dap::{DebugPort, MemAp};
pub use error::{Error, Result};
pub use swd::{Port, ReadSlot, SwdProbe, SwdRequest};
pub use target::TargetMemory;
