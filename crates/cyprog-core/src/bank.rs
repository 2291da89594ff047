//! Flash bank bookkeeping types

/// One erase/protect unit of a flash bank
///
/// Both state fields are tri-state: `None` means "not checked yet",
/// which is how every sector starts after a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashSector {
    /// Offset from the bank base address
    pub offset: u32,
    /// Sector size in bytes
    pub size: u32,
    /// Whether the sector is known to be erased
    pub erased: Option<bool>,
    /// Whether the sector is known to be protected
    pub protected: Option<bool>,
}

impl FlashSector {
    /// A freshly probed sector: erase state unknown, assumed protected
    /// until a real protection check runs
    pub fn unknown(offset: u32, size: u32) -> Self {
        Self {
            offset,
            size,
            erased: None,
            protected: Some(true),
        }
    }
}
