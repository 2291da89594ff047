//! Target memory access contract
//!
//! Flash drivers do not talk SWD themselves; they consume this trait,
//! which models the register-access primitive the debug framework
//! provides. The stock implementation is [`crate::MemAp`], but tests
//! inject an in-memory fake.

use crate::error::Result;

/// Word and byte access to the target's memory map
pub trait TargetMemory {
    fn read_u8(&mut self, addr: u32) -> Result<u8>;

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()>;

    fn read_u32(&mut self, addr: u32) -> Result<u32>;

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Whether the target core is currently halted under debug control
    fn is_halted(&mut self) -> Result<bool>;
}
