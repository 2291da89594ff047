//! PSoC 5LP flash bank driver

use std::time::Duration;

use cyprog_core::{FlashSector, TargetMemory};
use log::{error, info};

use crate::chips::{self, Protection};
use crate::error::{Psoc5Error, Result};
use crate::spc;

/// Every known PSoC 5LP has 256 byte rows and at most 256 KB of flash
const DEFAULT_FLASH_KB: u32 = 256;

/// How long a full chip erase may take before the driver gives up
const ERASE_DEADLINE: Duration = Duration::from_secs(10);

/// A probed (or probeable) PSoC 5LP flash bank
///
/// The driver owns its target memory handle; on real hardware that is a
/// MEM-AP over the KitProg, in tests an in-memory fake.
pub struct Psoc5Flash<M> {
    mem: M,
    row_size: u32,
    /// When set, overrides whatever the probe derives
    user_bank_size: Option<u32>,
    probed: bool,
    silicon_id: u32,
    chip_protection: u8,
    program_row_cmd: u8,
    erase_deadline: Duration,
    base: u32,
    size: u32,
    sectors: Vec<FlashSector>,
}

impl<M: TargetMemory> Psoc5Flash<M> {
    pub fn new(mem: M, user_bank_size: Option<u32>) -> Self {
        Self {
            mem,
            row_size: spc::BYTES_PER_ROW,
            user_bank_size,
            probed: false,
            silicon_id: 0,
            chip_protection: 0,
            program_row_cmd: spc::CMD_PROGRAM_ROW,
            erase_deadline: ERASE_DEADLINE,
            base: 0,
            size: 0,
            sectors: Vec::new(),
        }
    }

    /// Read the silicon id and rebuild the bank geometry
    pub fn probe(&mut self) -> Result<()> {
        if !self.mem.is_halted()? {
            error!("Target not halted");
            return Err(Psoc5Error::TargetNotHalted);
        }

        self.probed = false;
        self.program_row_cmd = spc::CMD_PROGRAM_ROW;

        // Some adapters report errors from the previous transaction
        // late; a throwaway read flushes them out before the id read.
        let _ = self.mem.read_u32(spc::SPC_CPU_DATA);

        let silicon_id = self.mem.read_u32(spc::DEVICE_ID)?;

        let mut flash_kb = DEFAULT_FLASH_KB;
        if let Some(details) = chips::details_by_id(silicon_id) {
            info!("{} device detected.", details.part_number);
            flash_kb = details.flash_kb;
        }

        // A configured bank size always wins over the probed value, to
        // work around parts with bogus size information
        if let Some(user_size) = self.user_bank_size {
            info!("ignoring flash probed value, using configured bank size");
            flash_kb = user_size / 1024;
        }

        info!("flash size = {} kbytes", flash_kb);

        let num_rows = flash_kb * 1024 / self.row_size;
        if num_rows == 0 {
            return Err(Psoc5Error::GeometryInconsistent);
        }

        self.base = 0;
        self.size = num_rows * self.row_size;
        self.sectors = (0..num_rows)
            .map(|i| FlashSector::unknown(i * self.row_size, self.row_size))
            .collect();

        info!("flash bank set {} rows", num_rows);
        self.silicon_id = silicon_id;
        self.probed = true;

        Ok(())
    }

    /// Probe only if no successful probe has run yet
    pub fn auto_probe(&mut self) -> Result<()> {
        if self.probed {
            return Ok(());
        }
        self.probe()
    }

    /// Erase the entire flash through the "Erase All" SPC command
    pub fn mass_erase(&mut self) -> Result<()> {
        if !self.mem.is_halted()? {
            error!("Target not halted");
            return Err(Psoc5Error::TargetNotHalted);
        }

        spc::command(&mut self.mem, spc::CMD_ERASE_ALL, &[])?;
        spc::wait_idle(&mut self.mem, self.erase_deadline)?;

        for sector in &mut self.sectors {
            sector.erased = Some(true);
        }

        Ok(())
    }

    /// Sector erase is not implemented; only mass erase works
    pub fn erase(&mut self, _first: u32, _last: u32) -> Result<()> {
        Err(Psoc5Error::Unsupported("sector erase, use mass erase"))
    }

    pub fn write(&mut self, _data: &[u8], _offset: u32) -> Result<()> {
        Err(Psoc5Error::Unsupported("row programming"))
    }

    pub fn protect(&mut self, _set: bool, _first: u32, _last: u32) -> Result<()> {
        Err(Psoc5Error::Unsupported("protection control"))
    }

    /// Select between "Write Row" (erases implicitly) and "Program Row"
    pub fn set_autoerase(&mut self, enable: bool) {
        if enable {
            self.program_row_cmd = spc::CMD_WRITE_ROW;
            info!("Flash auto-erase enabled, non mass erase commands will be ignored.");
        } else {
            self.program_row_cmd = spc::CMD_PROGRAM_ROW;
            info!("Flash auto-erase disabled. Use mass erase before flash programming.");
        }
    }

    pub fn autoerase(&self) -> bool {
        self.program_row_cmd == spc::CMD_WRITE_ROW
    }

    /// Human readable bank summary, available after a probe
    pub fn describe(&self) -> Result<String> {
        if !self.probed {
            return Err(Psoc5Error::NotProbed);
        }

        let mut out = match chips::details_by_id(self.silicon_id) {
            Some(details) => format!(
                "PSoC 5LP {} rev 0x{:04x} package {}",
                details.part_number,
                self.silicon_id & 0xffff,
                details.package
            ),
            None => format!("PSoC 5LP silicon id 0x{:08x}", self.silicon_id),
        };

        out.push_str(&format!(" flash {} kb", self.size / 1024));
        if let Some(protection) = Protection::from_raw(self.chip_protection) {
            out.push_str(&format!(" {}", protection));
        }

        Ok(out)
    }

    pub fn sectors(&self) -> &[FlashSector] {
        &self.sectors
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn silicon_id(&self) -> u32 {
        self.silicon_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyprog_core::Result as CoreResult;

    struct FakeMemory {
        device_id: u32,
        halted: bool,
        spc_writes: Vec<u8>,
        spc_idle: bool,
        device_id_reads: usize,
        dummy_reads: usize,
    }

    impl FakeMemory {
        fn new(device_id: u32) -> Self {
            Self {
                device_id,
                halted: true,
                spc_writes: Vec::new(),
                spc_idle: true,
                device_id_reads: 0,
                dummy_reads: 0,
            }
        }
    }

    impl TargetMemory for FakeMemory {
        fn read_u8(&mut self, addr: u32) -> CoreResult<u8> {
            assert_eq!(addr, spc::SPC_STATUS);
            Ok(if self.spc_idle { spc::SPC_IDLE } else { 0 })
        }

        fn write_u8(&mut self, addr: u32, value: u8) -> CoreResult<()> {
            assert_eq!(addr, spc::SPC_CPU_DATA);
            self.spc_writes.push(value);
            Ok(())
        }

        fn read_u32(&mut self, addr: u32) -> CoreResult<u32> {
            match addr {
                spc::DEVICE_ID => {
                    self.device_id_reads += 1;
                    Ok(self.device_id)
                }
                spc::SPC_CPU_DATA => {
                    self.dummy_reads += 1;
                    Ok(0)
                }
                _ => panic!("unexpected read from 0x{:08x}", addr),
            }
        }

        fn write_u32(&mut self, _addr: u32, _value: u32) -> CoreResult<()> {
            Ok(())
        }

        fn is_halted(&mut self) -> CoreResult<bool> {
            Ok(self.halted)
        }
    }

    #[test]
    fn probe_builds_the_full_geometry() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.probe().unwrap();

        assert_eq!(flash.size(), 256 * 1024);
        assert_eq!(flash.sectors().len(), 1024);
        let first = flash.sectors()[0];
        assert_eq!((first.offset, first.size), (0, 256));
        assert_eq!(first.erased, None);
        assert_eq!(first.protected, Some(true));
        let last = flash.sectors()[1023];
        assert_eq!(last.offset, 1023 * 256);

        // The quirk flush read happened before the id read
        assert_eq!(flash.mem.dummy_reads, 1);
    }

    #[test]
    fn probe_requires_a_halted_target() {
        let mut mem = FakeMemory::new(0x2e161069);
        mem.halted = false;
        let mut flash = Psoc5Flash::new(mem, None);
        assert!(matches!(flash.probe(), Err(Psoc5Error::TargetNotHalted)));
    }

    #[test]
    fn configured_bank_size_overrides_the_probe() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), Some(64 * 1024));
        flash.probe().unwrap();
        assert_eq!(flash.size(), 64 * 1024);
        assert_eq!(flash.sectors().len(), 256);
    }

    #[test]
    fn sub_kilobyte_bank_size_is_rejected() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), Some(512));
        assert!(matches!(
            flash.probe(),
            Err(Psoc5Error::GeometryInconsistent)
        ));
        assert!(flash.describe().is_err());
    }

    #[test]
    fn auto_probe_probes_only_once() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.auto_probe().unwrap();
        flash.auto_probe().unwrap();
        assert_eq!(flash.mem.device_id_reads, 1);
    }

    #[test]
    fn unknown_silicon_still_probes() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x12345678), None);
        flash.probe().unwrap();
        assert_eq!(flash.size(), 256 * 1024);
        assert_eq!(
            flash.describe().unwrap(),
            "PSoC 5LP silicon id 0x12345678 flash 256 kb protection VIRGIN"
        );
    }

    #[test]
    fn describe_names_known_parts() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.probe().unwrap();
        assert_eq!(
            flash.describe().unwrap(),
            "PSoC 5LP CY8C5888LTI-LP097 rev 0x1069 package QFN-68 flash 256 kb protection VIRGIN"
        );
    }

    #[test]
    fn mass_erase_issues_erase_all_and_marks_sectors() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.probe().unwrap();
        flash.mass_erase().unwrap();

        assert_eq!(flash.mem.spc_writes, vec![0xb6, 0xdc, 0x09]);
        assert!(flash.sectors().iter().all(|s| s.erased == Some(true)));
    }

    #[test]
    fn mass_erase_times_out_when_spc_stays_busy() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.probe().unwrap();
        flash.mem.spc_idle = false;
        flash.erase_deadline = Duration::ZERO;

        assert!(matches!(flash.mass_erase(), Err(Psoc5Error::SpcTimeout(_))));
        assert!(flash.sectors().iter().all(|s| s.erased.is_none()));
    }

    #[test]
    fn partial_operations_are_unsupported() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        flash.probe().unwrap();
        assert!(matches!(
            flash.erase(0, 3),
            Err(Psoc5Error::Unsupported(_))
        ));
        assert!(matches!(
            flash.write(&[0u8; 16], 0),
            Err(Psoc5Error::Unsupported(_))
        ));
        assert!(matches!(
            flash.protect(true, 0, 3),
            Err(Psoc5Error::Unsupported(_))
        ));
    }

    #[test]
    fn autoerase_selects_the_row_command() {
        let mut flash = Psoc5Flash::new(FakeMemory::new(0x2e161069), None);
        assert!(!flash.autoerase());
        flash.set_autoerase(true);
        assert!(flash.autoerase());
        assert_eq!(flash.program_row_cmd, spc::CMD_WRITE_ROW);
        flash.set_autoerase(false);
        assert_eq!(flash.program_row_cmd, spc::CMD_PROGRAM_ROW);
    }
}
