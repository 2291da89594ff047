//! KitProg device implementation
//!
//! This module provides the main `KitProg` struct that drives the
//! programmer through its vendor control commands, the KitBridge HID
//! channel and the bulk SWD transaction queue.

use std::thread::sleep;
use std::time::Duration;

use cyprog_core::{Port, ReadSlot, SwdProbe};

use crate::error::{KitProgError, Result};
use crate::protocol::*;
use crate::queue::TransferQueue;
use crate::transport::{Transport, UsbTransport};

/// Firmware and target information reported by the adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct KitProgInfo {
    pub major_version: u8,
    pub minor_version: u8,
    pub hardware_version: u8,
    /// Measured target supply voltage
    pub millivolts: u16,
}

/// An opened and initialized KitProg adapter
///
/// Construction runs the full bring-up sequence: firmware queries over
/// HID, the protocol selection dance, an SWD bus reset and target
/// acquisition. A value of this type is therefore always ready to queue
/// SWD transactions.
pub struct KitProg<T> {
    transport: T,
    queue: TransferQueue,
    info: KitProgInfo,
}

impl KitProg<UsbTransport> {
    /// Open the first KitProg, or the one with the given serial number
    pub fn open(serial: Option<&str>) -> Result<Self> {
        Self::with_transport(UsbTransport::open(serial)?)
    }
}

impl<T: Transport> KitProg<T> {
    /// Initialize a KitProg over an already opened transport
    pub fn with_transport(transport: T) -> Result<Self> {
        let mut kitprog = Self {
            transport,
            queue: TransferQueue::new(PACKET_SIZE),
            info: KitProgInfo::default(),
        };
        kitprog.init()?;
        Ok(kitprog)
    }

    fn init(&mut self) -> Result<()> {
        self.refresh_info()?;

        // Firmware quirk: this write has no documented meaning but the
        // programmer misbehaves without it
        self.set_unknown()?;

        self.set_protocol(PROTOCOL_SWD)?;
        self.swd_bus_reset()?;

        // Acquisition must run with max_attempts >= 1 even when no
        // specific target is wanted, or SWDIO/SWCLK stay inputs
        self.acquire_any()?;

        log::info!(
            "KitProg v{}.{:02}",
            self.info.major_version,
            self.info.minor_version
        );
        log::info!("Hardware version: {}", self.info.hardware_version);
        log::info!(
            "VTARG = {}.{:03} V",
            self.info.millivolts / 1000,
            self.info.millivolts % 1000
        );

        Ok(())
    }

    /// The information gathered when the device was opened
    pub fn info(&self) -> &KitProgInfo {
        &self.info
    }

    /// Re-query firmware version and target voltage
    pub fn refresh_info(&mut self) -> Result<KitProgInfo> {
        let command = [HID_TYPE_START | HID_TYPE_WRITE, 0x00, HID_COMMAND_VERSION];
        let mut data = [0u8; 64];
        self.transport.hid_command(&command, &mut data)?;
        self.info.hardware_version = data[1];
        self.info.minor_version = data[2];
        self.info.major_version = data[3];

        let command = [HID_TYPE_START | HID_TYPE_READ, 0x00, HID_COMMAND_POWER];
        let mut data = [0u8; 64];
        self.transport.hid_command(&command, &mut data)?;
        self.info.millivolts = (data[4] as u16) << 8 | data[3] as u16;

        Ok(self.info)
    }

    /// Toggle the target reset line
    pub fn reset_target(&mut self) -> Result<()> {
        self.control_command(
            CONTROL_TYPE_WRITE,
            control_value(CONTROL_MODE_RESET_TARGET),
            0,
        )
    }

    /// Acquire a specific target device
    pub fn acquire_target(
        &mut self,
        device: TargetDevice,
        mode: AcquireMode,
        max_attempts: u8,
    ) -> Result<()> {
        let request = AcquireRequest::new(device, mode, max_attempts);
        self.control_command(
            CONTROL_TYPE_WRITE,
            control_value(CONTROL_MODE_ACQUIRE_SWD_TARGET),
            request.index(),
        )
    }

    /// Try to acquire any device family that will respond
    fn acquire_any(&mut self) -> Result<()> {
        let candidates = [
            TargetDevice::Psoc4,
            TargetDevice::Unknown,
            TargetDevice::Psoc5,
        ];

        for device in candidates {
            self.acquire_target(device, AcquireMode::Reset, 3)?;
            if self.get_status().is_ok() {
                log::debug!("acquired target as {:?}", device);
                return Ok(());
            }
        }

        Err(KitProgError::NoTargetFound)
    }

    fn set_protocol(&mut self, protocol: u16) -> Result<()> {
        self.control_command(
            CONTROL_TYPE_WRITE,
            control_value(CONTROL_MODE_SET_PROGRAMMER_PROTOCOL),
            protocol,
        )
    }

    fn set_unknown(&mut self) -> Result<()> {
        self.control_command(CONTROL_TYPE_WRITE, 0x03 << 8 | 0x04, 0)
    }

    fn swd_bus_reset(&mut self) -> Result<()> {
        self.control_command(
            CONTROL_TYPE_WRITE,
            control_value(CONTROL_MODE_RESET_SWD_BUS),
            0,
        )
    }

    /// Poll the programmer status byte
    ///
    /// The firmware occasionally answers with an empty data stage while
    /// busy, so a zero byte result is retried a couple of times before
    /// giving up. A NACK is never retried.
    fn get_status(&mut self) -> Result<()> {
        let mut data = Vec::new();
        for _ in 0..3 {
            data = self.transport.control(
                CONTROL_TYPE_READ,
                control_value(CONTROL_MODE_POLL_PROGRAMMER_STATUS),
                0,
            )?;
            if !data.is_empty() {
                break;
            }
            sleep(Duration::from_millis(1));
        }

        Self::check_status(&data)
    }

    fn control_command(&mut self, request: u8, value: u16, index: u16) -> Result<()> {
        let data = self.transport.control(request, value, index)?;
        Self::check_status(&data)
    }

    fn check_status(data: &[u8]) -> Result<()> {
        match data.first() {
            None => Err(KitProgError::NoResponse),
            Some(&PROGRAMMER_OK_ACK) => Ok(()),
            Some(_) => Err(KitProgError::Nack),
        }
    }
}

fn core_error(e: &KitProgError) -> cyprog_core::Error {
    match e {
        KitProgError::Nack => cyprog_core::Error::ProtocolNack,
        _ => cyprog_core::Error::TransportFailure,
    }
}

impl<T: Transport> SwdProbe for KitProg<T> {
    fn swd_read(&mut self, port: Port, addr: u8) -> ReadSlot {
        self.queue.queue_read(&mut self.transport, port, addr)
    }

    fn swd_write(&mut self, port: Port, addr: u8, value: u32) {
        self.queue.queue_write(&mut self.transport, port, addr, value)
    }

    fn swd_run(&mut self) -> cyprog_core::Result<()> {
        self.queue.run(&mut self.transport)
    }

    fn line_reset(&mut self) -> cyprog_core::Result<()> {
        self.swd_bus_reset().map_err(|e| core_error(&e))
    }
}
