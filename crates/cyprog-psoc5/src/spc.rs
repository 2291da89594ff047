//! System Performance Controller mailbox
//!
//! Commands are fed to the SPC one byte at a time through the CPU data
//! register: two key bytes (the second folded with the command byte),
//! the command itself, then any argument bytes. Completion is signalled
//! by the idle bit in the status register.

use std::thread::sleep;
use std::time::{Duration, Instant};

use cyprog_core::TargetMemory;
use log::debug;

use crate::error::{Psoc5Error, Result};

/* register locations */
pub const SPC_CPU_DATA: u32 = 0x4000_4720;
pub const SPC_STATUS: u32 = 0x4000_4722;
pub const DEVICE_ID: u32 = 0x4008_001c;

pub const SPC_KEY1: u8 = 0xb6;
pub const SPC_KEY2: u8 = 0xd3;

pub const SPC_IDLE: u8 = 1 << 1;

pub const CMD_LOAD_ROW: u8 = 0x02;
pub const CMD_WRITE_ROW: u8 = 0x05;
pub const CMD_PROGRAM_ROW: u8 = 0x07;
pub const CMD_ERASE_ALL: u8 = 0x09;
pub const CMD_READ_HIDDEN_ROW: u8 = 0x0a;
pub const CMD_PROTECT: u8 = 0x0b;
pub const CMD_CHECKSUM: u8 = 0x0c;

pub const BYTES_PER_ROW: u32 = 256;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Issue one SPC command with its argument bytes
pub fn command<M: TargetMemory>(mem: &mut M, cmd: u8, args: &[u8]) -> Result<()> {
    debug!("SPC command: 0x{:02x}", cmd);

    let result = (|| {
        mem.write_u8(SPC_CPU_DATA, SPC_KEY1)?;
        mem.write_u8(SPC_CPU_DATA, SPC_KEY2.wrapping_add(cmd))?;
        mem.write_u8(SPC_CPU_DATA, cmd)?;
        for &arg in args {
            mem.write_u8(SPC_CPU_DATA, arg)?;
        }
        Ok(())
    })();

    if result.is_err() {
        log::error!("SPC command failed");
    }
    result
}

/// Poll the status register until the SPC reports idle
///
/// The poll is bounded; a wedged SPC (after a failed erase for example)
/// would otherwise hang the host forever.
pub fn wait_idle<M: TargetMemory>(mem: &mut M, deadline: Duration) -> Result<()> {
    let start = Instant::now();
    loop {
        let status = mem.read_u8(SPC_STATUS)?;
        if status & SPC_IDLE != 0 {
            return Ok(());
        }
        if start.elapsed() >= deadline {
            return Err(Psoc5Error::SpcTimeout(deadline));
        }
        sleep(POLL_INTERVAL);
    }
}
