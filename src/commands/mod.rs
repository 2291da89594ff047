//! CLI command implementations
//!
//! Each command opens its own adapter session. The flash commands stack
//! the full bring-up on top: KitProg acquisition, debug port power-up,
//! core halt, then the PSoC 5LP flash driver.

pub mod info;
pub mod mass_erase;
pub mod probe;
pub mod reset;

use cyprog_core::{DebugPort, MemAp};
use cyprog_kitprog::{KitProg, UsbTransport};
use cyprog_psoc5::Psoc5Flash;

/// Open an adapter, power up the debug port and halt the core
fn open_halted_target(
    serial: Option<&str>,
) -> Result<MemAp<KitProg<UsbTransport>>, Box<dyn std::error::Error>> {
    let kitprog = KitProg::open(serial)?;
    let mut ap = DebugPort::new(kitprog).power_up()?;
    ap.halt()?;
    Ok(ap)
}

/// A flash driver on a freshly halted target
fn open_flash(
    serial: Option<&str>,
    size: Option<u32>,
) -> Result<Psoc5Flash<MemAp<KitProg<UsbTransport>>>, Box<dyn std::error::Error>> {
    Ok(Psoc5Flash::new(open_halted_target(serial)?, size))
}
