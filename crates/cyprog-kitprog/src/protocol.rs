//! KitProg USB protocol definitions
//!
//! Control transfers on the bulk interface steer the programmer itself;
//! the actual SWD traffic travels over the bulk endpoint pair. The HID
//! interface speaks a separate three byte command format.

/// Cypress Semiconductor vendor ID
pub const KITPROG_VID: u16 = 0x04b4;
/// KitProg product ID
pub const KITPROG_PID: u16 = 0xf139;

/// Bulk endpoint addresses on the programmer interface
pub const BULK_EP_IN: u8 = 0x81;
pub const BULK_EP_OUT: u8 = 0x02;

/// The bulk interface number the programmer claims
pub const PROGRAMMER_INTERFACE: u8 = 1;

/// 512 bytes works reliably across firmware revisions
pub const PACKET_SIZE: usize = 512;

/// bRequest values for the vendor control endpoint
pub const CONTROL_TYPE_READ: u8 = 0x01;
pub const CONTROL_TYPE_WRITE: u8 = 0x02;

/// Low byte of wValue for programmer commands
pub const CONTROL_COMMAND_PROGRAM: u8 = 0x07;

/// High byte of wValue selects the programmer operation
pub const CONTROL_MODE_POLL_PROGRAMMER_STATUS: u8 = 0x01;
pub const CONTROL_MODE_RESET_TARGET: u8 = 0x04;
pub const CONTROL_MODE_SET_PROGRAMMER_PROTOCOL: u8 = 0x40;
pub const CONTROL_MODE_ACQUIRE_SWD_TARGET: u8 = 0x42;
pub const CONTROL_MODE_RESET_SWD_BUS: u8 = 0x43;

/// Wire protocol selector passed in wIndex of the protocol command
pub const PROTOCOL_SWD: u16 = 0x01;

/// Single status byte returned by every control command
pub const PROGRAMMER_OK_ACK: u8 = 0x01;

/// HID report type bits (first byte of a KitBridge command)
pub const HID_TYPE_WRITE: u8 = 0x00;
pub const HID_TYPE_READ: u8 = 0x01;
pub const HID_TYPE_START: u8 = 0x02;

/// KitBridge command bytes
pub const HID_COMMAND_POWER: u8 = 0x80;
pub const HID_COMMAND_VERSION: u8 = 0x81;

/// Build the wValue for a programmer control command
pub const fn control_value(mode: u8) -> u16 {
    (mode as u16) << 8 | CONTROL_COMMAND_PROGRAM as u16
}

/// Target device families the acquisition command knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDevice {
    Psoc4 = 0x00,
    Unknown = 0x01,
    Psoc5 = 0x03,
}

/// How the firmware should wrestle the target into the acquired state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    Reset = 0x00,
    PowerCycle = 0x01,
}

/// The wIndex packing of an acquisition command
///
/// The firmware expects attempt count, acquire mode and device family
/// packed into a single 16 bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireRequest(u16);

impl AcquireRequest {
    pub fn new(device: TargetDevice, mode: AcquireMode, max_attempts: u8) -> Self {
        Self((max_attempts as u16) << 8 | (mode as u16) << 4 | device as u16)
    }

    pub fn max_attempts(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn mode(&self) -> u8 {
        (self.0 >> 4) as u8 & 0x0F
    }

    pub fn device(&self) -> u8 {
        self.0 as u8 & 0x0F
    }

    pub fn index(&self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_request_packing() {
        let req = AcquireRequest::new(TargetDevice::Psoc5, AcquireMode::Reset, 3);
        assert_eq!(req.index(), 0x0303);
        assert_eq!(req.max_attempts(), 3);
        assert_eq!(req.mode(), 0);
        assert_eq!(req.device(), 3);

        let req = AcquireRequest::new(TargetDevice::Psoc4, AcquireMode::PowerCycle, 1);
        assert_eq!(req.index(), 0x0110);
    }

    #[test]
    fn control_value_places_mode_in_high_byte() {
        assert_eq!(control_value(CONTROL_MODE_ACQUIRE_SWD_TARGET), 0x4207);
        assert_eq!(control_value(CONTROL_MODE_POLL_PROGRAMMER_STATUS), 0x0107);
    }
}
