//! ADIv5 debug-port power-up and MEM-AP memory access
//!
//! This is the thin slice of the ARM Debug Interface the flash tooling
//! needs: bring the debug domain out of reset after acquisition, then
//! turn word/byte memory accesses into CSW/TAR/DRW register traffic on
//! access port 0. AP reads are posted, so every read of DRW is followed
//! by a read of RDBUFF and the RDBUFF value is the one that counts.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::swd::{Port, SwdProbe};
use crate::target::TargetMemory;

// Debug port registers
pub const DP_DPIDR: u8 = 0x0;
pub const DP_ABORT: u8 = 0x0;
pub const DP_CTRL_STAT: u8 = 0x4;
pub const DP_SELECT: u8 = 0x8;
pub const DP_RDBUFF: u8 = 0xC;

// Access port registers (bank 0)
pub const AP_CSW: u8 = 0x0;
pub const AP_TAR: u8 = 0x4;
pub const AP_DRW: u8 = 0xC;

// ABORT: clear all sticky error flags
const ABORT_CLEAR_STICKY: u32 = 0x1E;

// CTRL/STAT power-up request and acknowledge bits
const CDBGPWRUPREQ: u32 = 1 << 28;
const CDBGPWRUPACK: u32 = 1 << 29;
const CSYSPWRUPREQ: u32 = 1 << 30;
const CSYSPWRUPACK: u32 = 1 << 31;

// CSW: HPROT1 data access, debug master, no auto-increment
const CSW_BASE: u32 = 0x2300_0000;
const CSW_SIZE_BYTE: u32 = 0b000;
const CSW_SIZE_WORD: u32 = 0b010;

// Cortex-M debug halting control and status register
const DHCSR: u32 = 0xE000_EDF0;
const DHCSR_DBGKEY: u32 = 0xA05F << 16;
const DHCSR_C_DEBUGEN: u32 = 1 << 0;
const DHCSR_C_HALT: u32 = 1 << 1;
const DHCSR_S_HALT: u32 = 1 << 17;

const PWRUP_ATTEMPTS: usize = 100;

/// A powered-down debug port reached through an SWD adapter
pub struct DebugPort<P> {
    probe: P,
}

impl<P: SwdProbe> DebugPort<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Power up the debug domain and hand back a MEM-AP on AP 0
    ///
    /// Reads DPIDR (mandatory first access after a line reset), clears
    /// sticky errors, selects AP 0 bank 0, then requests debug and
    /// system power and polls for both acknowledge bits.
    pub fn power_up(mut self) -> Result<MemAp<P>> {
        let dpidr = self.probe.swd_read(Port::Dp, DP_DPIDR);
        self.probe.swd_run()?;
        debug!("DPIDR = 0x{:08x}", dpidr.get());

        self.probe.swd_write(Port::Dp, DP_ABORT, ABORT_CLEAR_STICKY);
        self.probe.swd_write(Port::Dp, DP_SELECT, 0);
        self.probe
            .swd_write(Port::Dp, DP_CTRL_STAT, CDBGPWRUPREQ | CSYSPWRUPREQ);
        self.probe.swd_run()?;

        for _ in 0..PWRUP_ATTEMPTS {
            let stat = self.probe.swd_read(Port::Dp, DP_CTRL_STAT);
            self.probe.swd_run()?;
            if stat.get() & (CDBGPWRUPACK | CSYSPWRUPACK) == (CDBGPWRUPACK | CSYSPWRUPACK) {
                debug!("debug domain powered up, CTRL/STAT = 0x{:08x}", stat.get());
                return Ok(MemAp {
                    probe: self.probe,
                    csw: None,
                });
            }
        }

        Err(Error::TransportFailure)
    }
}

/// Memory access port on AP 0 of a powered-up debug port
pub struct MemAp<P> {
    probe: P,
    /// Last CSW value written, to skip redundant setup writes
    csw: Option<u32>,
}

impl<P: SwdProbe> MemAp<P> {
    fn set_csw(&mut self, size: u32) {
        let csw = CSW_BASE | size;
        if self.csw != Some(csw) {
            self.probe.swd_write(Port::Ap, AP_CSW, csw);
            self.csw = Some(csw);
        }
    }

    /// Halt the target core via DHCSR
    pub fn halt(&mut self) -> Result<()> {
        debug!("halting target core");
        self.write_u32(DHCSR, DHCSR_DBGKEY | DHCSR_C_HALT | DHCSR_C_DEBUGEN)?;
        if !self.is_halted()? {
            return Err(Error::TargetNotHalted);
        }
        Ok(())
    }
}

impl<P: SwdProbe> TargetMemory for MemAp<P> {
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        self.set_csw(CSW_SIZE_WORD);
        self.probe.swd_write(Port::Ap, AP_TAR, addr);
        // Posted AP read: the DRW result arrives in RDBUFF
        let _posted = self.probe.swd_read(Port::Ap, AP_DRW);
        let value = self.probe.swd_read(Port::Dp, DP_RDBUFF);
        self.probe.swd_run()?;
        trace!("mem read32 0x{:08x} = 0x{:08x}", addr, value.get());
        Ok(value.get())
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        self.set_csw(CSW_SIZE_WORD);
        self.probe.swd_write(Port::Ap, AP_TAR, addr);
        self.probe.swd_write(Port::Ap, AP_DRW, value);
        trace!("mem write32 0x{:08x} = 0x{:08x}", addr, value);
        self.probe.swd_run()
    }

    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        self.set_csw(CSW_SIZE_BYTE);
        self.probe.swd_write(Port::Ap, AP_TAR, addr);
        let _posted = self.probe.swd_read(Port::Ap, AP_DRW);
        let value = self.probe.swd_read(Port::Dp, DP_RDBUFF);
        self.probe.swd_run()?;
        // Sub-word DRW accesses travel on the byte lane of addr[1:0]
        Ok((value.get() >> (8 * (addr & 3))) as u8)
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        self.set_csw(CSW_SIZE_BYTE);
        self.probe.swd_write(Port::Ap, AP_TAR, addr);
        self.probe
            .swd_write(Port::Ap, AP_DRW, u32::from(value) << (8 * (addr & 3)));
        self.probe.swd_run()
    }

    fn is_halted(&mut self) -> Result<bool> {
        Ok(self.read_u32(DHCSR)? & DHCSR_S_HALT != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swd::{ReadSlot, SwdRequest};

    /// Records queued accesses and answers reads from a script
    #[derive(Default)]
    struct ScriptedProbe {
        log: Vec<(SwdRequest, u32)>,
        responses: Vec<u32>,
        cursor: usize,
    }

    impl SwdProbe for ScriptedProbe {
        fn swd_read(&mut self, port: Port, addr: u8) -> ReadSlot {
            let slot = ReadSlot::new();
            let value = self.responses.get(self.cursor).copied().unwrap_or(0);
            self.cursor += 1;
            slot.set(value);
            self.log.push((SwdRequest::read(port, addr), value));
            slot
        }

        fn swd_write(&mut self, port: Port, addr: u8, value: u32) {
            self.log.push((SwdRequest::write(port, addr), value));
        }

        fn swd_run(&mut self) -> Result<()> {
            Ok(())
        }

        fn line_reset(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn word_read_sets_up_csw_and_tar_then_reads_rdbuff() {
        let mut probe = ScriptedProbe {
            responses: vec![0xDEAD_0000, 0x1234_5678],
            ..Default::default()
        };
        let mut ap = MemAp {
            probe: &mut probe,
            csw: None,
        };

        let value = ap.read_u32(0x4000_4720).unwrap();
        assert_eq!(value, 0x1234_5678);

        let log = &probe.log;
        assert_eq!(log.len(), 4);
        assert_eq!(log[0].0, SwdRequest::write(Port::Ap, AP_CSW));
        assert_eq!(log[0].1, CSW_BASE | CSW_SIZE_WORD);
        assert_eq!(log[1].0, SwdRequest::write(Port::Ap, AP_TAR));
        assert_eq!(log[1].1, 0x4000_4720);
        assert_eq!(log[2].0, SwdRequest::read(Port::Ap, AP_DRW));
        assert_eq!(log[3].0, SwdRequest::read(Port::Dp, DP_RDBUFF));
    }

    #[test]
    fn byte_access_uses_the_address_byte_lane() {
        // 0x40004722 sits on lane 2, so the value comes from bits 16-23
        let mut probe = ScriptedProbe {
            responses: vec![0, 0x00A5_0000],
            ..Default::default()
        };
        let mut ap = MemAp {
            probe: &mut probe,
            csw: None,
        };
        assert_eq!(ap.read_u8(0x4000_4722).unwrap(), 0xA5);

        ap.write_u8(0x4000_4721, 0x3C).unwrap();
        let (req, value) = *probe.log.last().unwrap();
        assert_eq!(req, SwdRequest::write(Port::Ap, AP_DRW));
        assert_eq!(value, 0x3C << 8);
    }

    #[test]
    fn csw_writes_are_elided_when_unchanged() {
        let mut probe = ScriptedProbe::default();
        let mut ap = MemAp {
            probe: &mut probe,
            csw: None,
        };
        ap.write_u32(0x2000_0000, 1).unwrap();
        ap.write_u32(0x2000_0004, 2).unwrap();

        let csw_writes = probe
            .log
            .iter()
            .filter(|(req, _)| *req == SwdRequest::write(Port::Ap, AP_CSW))
            .count();
        assert_eq!(csw_writes, 1);
    }
}
