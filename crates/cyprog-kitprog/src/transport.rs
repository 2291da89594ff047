//! USB transport for the KitProg
//!
//! The adapter is reached through two handles at once: the vendor bulk
//! interface (claimed through nusb) and the KitBridge HID interface
//! (opened through hidapi against the same serial number). Everything
//! device level code needs from either handle is behind the [`Transport`]
//! trait so the protocol logic can be exercised against a mock.

use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use nusb::transfer::{Buffer, Bulk, In, Out};
use nusb::{Endpoint, Interface, MaybeFuture};

use crate::error::{KitProgError, Result};
use crate::protocol::*;

const USB_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw transfer operations the KitProg protocol layer is built on
pub trait Transport {
    /// Vendor control transfer with a short IN data stage
    ///
    /// Every KitProg control command answers with a single status byte;
    /// the returned vector may legitimately be empty when the firmware
    /// is still busy.
    fn control(&mut self, request: u8, value: u16, index: u16) -> Result<Vec<u8>>;

    /// Write a packet to the bulk OUT endpoint
    fn bulk_write(&mut self, data: &[u8]) -> Result<()>;

    /// Read from the bulk IN endpoint, returning the byte count
    fn bulk_read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Send a KitBridge command and read its response report
    fn hid_command(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize>;
}

/// The real hardware transport
pub struct UsbTransport {
    // Declaration order matters: the HID handle closes before the bulk
    // interface is released, mirroring the teardown the firmware expects.
    hid: HidDevice,
    interface: Interface,
}

impl UsbTransport {
    /// Open the first KitProg, or the one with the given serial number
    pub fn open(serial: Option<&str>) -> Result<Self> {
        let device_info = nusb::list_devices()
            .wait()
            .map_err(|e| KitProgError::OpenFailed(e.to_string()))?
            .find(|d| {
                d.vendor_id() == KITPROG_VID
                    && d.product_id() == KITPROG_PID
                    && serial.is_none_or(|s| d.serial_number() == Some(s))
            })
            .ok_or(KitProgError::DeviceNotFound)?;

        log::debug!(
            "Opening KitProg at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| KitProgError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(PROGRAMMER_INTERFACE)
            .wait()
            .map_err(|e| KitProgError::ClaimFailed(e.to_string()))?;

        // The HID interface must point at the same physical device, so
        // resolve it by the serial number of the device we just claimed.
        let device_serial = device_info.serial_number().map(str::to_owned);
        let api = HidApi::new().map_err(|e| KitProgError::HidOpenFailed(e.to_string()))?;
        let hid = match device_serial.as_deref() {
            Some(s) => api.open_serial(KITPROG_VID, KITPROG_PID, s),
            None => api.open(KITPROG_VID, KITPROG_PID),
        }
        .map_err(|e| KitProgError::HidOpenFailed(e.to_string()))?;

        Ok(Self { hid, interface })
    }
}

impl Transport for UsbTransport {
    fn control(&mut self, request: u8, value: u16, index: u16) -> Result<Vec<u8>> {
        let data = self
            .interface
            .control_in(
                nusb::transfer::ControlIn {
                    control_type: nusb::transfer::ControlType::Vendor,
                    recipient: nusb::transfer::Recipient::Device,
                    request,
                    value,
                    index,
                    length: 1,
                },
                USB_TIMEOUT,
            )
            .wait()
            .map_err(|e| KitProgError::TransferFailed(e.to_string()))?;

        Ok(data)
    }

    fn bulk_write(&mut self, data: &[u8]) -> Result<()> {
        let mut out_ep: Endpoint<Bulk, Out> = self
            .interface
            .endpoint(BULK_EP_OUT)
            .map_err(|e| KitProgError::TransferFailed(e.to_string()))?;

        let mut out_buf = Buffer::new(data.len());
        out_buf.extend_from_slice(data);

        let completion = out_ep.transfer_blocking(out_buf, USB_TIMEOUT);
        completion
            .into_result()
            .map_err(|e| KitProgError::TransferFailed(e.to_string()))?;

        Ok(())
    }

    fn bulk_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut in_ep: Endpoint<Bulk, In> = self
            .interface
            .endpoint(BULK_EP_IN)
            .map_err(|e| KitProgError::TransferFailed(e.to_string()))?;

        let max_packet_size = in_ep.max_packet_size();
        let request_len = buf.len().div_ceil(max_packet_size) * max_packet_size;
        let mut in_buf = Buffer::new(request_len);
        in_buf.set_requested_len(request_len);

        let completion = in_ep.transfer_blocking(in_buf, USB_TIMEOUT);
        let data = completion
            .into_result()
            .map_err(|e| KitProgError::TransferFailed(e.to_string()))?;

        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn hid_command(&mut self, command: &[u8], response: &mut [u8]) -> Result<usize> {
        self.hid.write(command)?;
        let len = self.hid.read(response)?;
        Ok(len)
    }
}
