//! SWD request encoding and the adapter capability trait
//!
//! An SWD transaction starts with a single request byte whose layout is
//! fixed by the ARM Debug Interface specification. Keeping it as an
//! explicit bit-layout type with named accessors avoids the silent
//! shift/mask mistakes that plague drivers which pass bare `u8`s around.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Raw bits of an SWD request header
    ///
    /// Bit layout (LSB first on the wire):
    /// - bit 0: start (always 1)
    /// - bit 1: APnDP - 1 selects the access port, 0 the debug port
    /// - bit 2: RnW - 1 reads, 0 writes
    /// - bits 3-4: A[3:2], the register address bits
    /// - bit 5: parity over APnDP, RnW and A[3:2]
    /// - bit 6: stop (always 0)
    /// - bit 7: park (always 1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RequestBits: u8 {
        const START  = 1 << 0;
        const AP_NDP = 1 << 1;
        const RNW    = 1 << 2;
        const A2     = 1 << 3;
        const A3     = 1 << 4;
        const PARITY = 1 << 5;
        const STOP   = 1 << 6;
        const PARK   = 1 << 7;
    }
}

/// The two register address spaces an SWD request can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// Debug port registers (DPIDR, CTRL/STAT, SELECT, RDBUFF, ...)
    Dp,
    /// Access port registers (CSW, TAR, DRW, ...)
    Ap,
}

/// One encoded SWD request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwdRequest(RequestBits);

impl SwdRequest {
    /// Encode a read request for the given port and register offset
    pub fn read(port: Port, addr: u8) -> Self {
        Self::new(port, addr, true)
    }

    /// Encode a write request for the given port and register offset
    pub fn write(port: Port, addr: u8) -> Self {
        Self::new(port, addr, false)
    }

    fn new(port: Port, addr: u8, rnw: bool) -> Self {
        let mut bits = RequestBits::START | RequestBits::PARK;
        if let Port::Ap = port {
            bits |= RequestBits::AP_NDP;
        }
        if rnw {
            bits |= RequestBits::RNW;
        }
        // A[3:2] of the register offset land in header bits 3 and 4
        bits |= RequestBits::from_bits_truncate((addr & 0x0C) << 1);

        // Even parity over APnDP, RnW and A[3:2]
        let payload = bits.bits() >> 1 & 0x0F;
        if payload.count_ones() % 2 == 1 {
            bits |= RequestBits::PARITY;
        }

        Self(bits)
    }

    /// Does this request read from the target?
    pub fn is_read(&self) -> bool {
        self.0.contains(RequestBits::RNW)
    }

    /// Which register address space the request targets
    pub fn port(&self) -> Port {
        if self.0.contains(RequestBits::AP_NDP) {
            Port::Ap
        } else {
            Port::Dp
        }
    }

    /// The register offset encoded in A[3:2]
    pub fn addr(&self) -> u8 {
        (self.0.bits() >> 1) & 0x0C
    }

    /// The raw header byte as defined by ADI
    pub fn bits(&self) -> u8 {
        self.0.bits()
    }
}

impl fmt::Display for SwdRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} reg 0x{:x}",
            if self.is_read() { "read" } else { "write" },
            self.port(),
            self.addr(),
        )
    }
}

/// Destination for a queued read's result
///
/// The adapter's transaction queue holds a clone of this slot and stores
/// the decoded value into it exactly once when the queue is flushed. The
/// whole driver is single-threaded by design, so a shared `Cell` is all
/// the synchronization this needs.
#[derive(Debug, Clone, Default)]
pub struct ReadSlot(Rc<Cell<u32>>);

impl ReadSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoded value - meaningful only after a successful flush
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Store a decoded value; called by the queue during flush
    pub fn set(&self, value: u32) {
        self.0.set(value);
    }
}

/// Capability trait implemented by SWD debug adapters
///
/// Reads and writes are queued; nothing touches the wire until
/// [`SwdProbe::swd_run`] flushes the queue (the adapter may also flush
/// implicitly when its queue fills). Queued accesses hit the wire, and
/// their results are decoded, in strict enqueue order - including across
/// an implicit mid-sequence flush. A failed flush makes the error sticky:
/// later enqueues are dropped and `swd_run` keeps reporting the first
/// failure until it has been consumed.
pub trait SwdProbe {
    /// Queue a register read; the returned slot is filled on flush
    fn swd_read(&mut self, port: Port, addr: u8) -> ReadSlot;

    /// Queue a register write
    fn swd_write(&mut self, port: Port, addr: u8, value: u32);

    /// Flush the queue and surface the outcome of the whole batch
    fn swd_run(&mut self) -> Result<()>;

    /// Perform an SWD line reset
    fn line_reset(&mut self) -> Result<()>;
}

impl<T: SwdProbe + ?Sized> SwdProbe for &mut T {
    fn swd_read(&mut self, port: Port, addr: u8) -> ReadSlot {
        (**self).swd_read(port, addr)
    }

    fn swd_write(&mut self, port: Port, addr: u8, value: u32) {
        (**self).swd_write(port, addr, value)
    }

    fn swd_run(&mut self) -> Result<()> {
        (**self).swd_run()
    }

    fn line_reset(&mut self) -> Result<()> {
        (**self).line_reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_has_fixed_framing_bits() {
        let req = SwdRequest::read(Port::Dp, 0x0);
        assert!(req.bits() & 0x01 != 0, "start bit");
        assert!(req.bits() & 0x40 == 0, "stop bit");
        assert!(req.bits() & 0x80 != 0, "park bit");
    }

    #[test]
    fn dpidr_read_encoding() {
        // DP read of register 0x0: APnDP=0, RnW=1, A=00, parity over one
        // set bit is 1
        let req = SwdRequest::read(Port::Dp, 0x0);
        assert_eq!(req.bits(), 0b1010_0101);
        assert!(req.is_read());
        assert_eq!(req.addr(), 0x0);
    }

    #[test]
    fn ap_write_encoding_roundtrip() {
        let req = SwdRequest::write(Port::Ap, 0xC);
        assert!(!req.is_read());
        assert_eq!(req.port(), Port::Ap);
        assert_eq!(req.addr(), 0xC);
        // APnDP=1, RnW=0, A[3:2]=11 - three set bits, parity set
        assert_eq!(req.bits(), 0b1011_1011);
    }

    #[test]
    fn parity_covers_only_payload_bits() {
        // DP write reg 0x4: A2 set only - one payload bit, parity set
        let req = SwdRequest::write(Port::Dp, 0x4);
        assert_eq!(req.bits() & 0x20, 0x20);
        // DP write reg 0xC: two payload bits, parity clear
        let req = SwdRequest::write(Port::Dp, 0xC);
        assert_eq!(req.bits() & 0x20, 0x00);
    }

    impl PartialEq for ReadSlot {
        fn eq(&self, other: &Self) -> bool {
            Rc::ptr_eq(&self.0, &other.0)
        }
    }

    #[test]
    fn read_slot_clones_share_storage() {
        let slot = ReadSlot::new();
        let clone = slot.clone();
        clone.set(0xAABBCCDD);
        assert_eq!(slot.get(), 0xAABBCCDD);
        assert_eq!(slot, clone);
    }
}
