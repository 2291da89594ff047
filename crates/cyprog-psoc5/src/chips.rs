//! Known PSoC 5LP silicon
//!
//! References:
//!   PSoC 5LP: CY8C58LP Family Datasheet, 001-84932
//!   PSoC 5LP Device Programming Specifications, 001-81290

use std::fmt;

/// Static description of one chip variant
#[derive(Debug, Clone, Copy)]
pub struct ChipDetails {
    /// Silicon id with the die revision bits stripped
    pub id: u16,
    pub part_number: &'static str,
    pub package: &'static str,
    pub flash_kb: u32,
}

/// Flash size could also be decoded from SPCIF geometry registers, but
/// the known parts are few enough to keep in a table.
const PSOC5_DEVICES: &[ChipDetails] = &[ChipDetails {
    id: 0xe161, // full id 0x2e161069
    part_number: "CY8C5888LTI-LP097",
    package: "QFN-68",
    flash_kb: 256,
}];

/// Look up a chip by the silicon id read from the device id register
///
/// The low 12 bits hold the die revision and are ignored for the match.
pub fn details_by_id(silicon_id: u32) -> Option<&'static ChipDetails> {
    let id = (silicon_id >> 12) as u16;
    let details = PSOC5_DEVICES.iter().find(|d| d.id == id);
    if details.is_none() {
        log::debug!("Unknown PSoC device silicon id 0x{:08x}.", silicon_id);
    }
    details
}

/// Chip level protection state as stored in flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    Virgin = 0x0,
    Open = 0x1,
    Protected = 0x2,
    Kill = 0x4,
}

impl Protection {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x0 => Some(Self::Virgin),
            0x1 => Some(Self::Open),
            0x2 => Some(Self::Protected),
            0x4 => Some(Self::Kill),
            _ => {
                log::warn!("Unknown protection state 0x{:02x}", raw);
                None
            }
        }
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virgin => write!(f, "protection VIRGIN"),
            Self::Open => write!(f, "protection open"),
            Self::Protected => write!(f, "PROTECTED"),
            Self::Kill => write!(f, "protection KILL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_die_revision() {
        // Same part, two different revisions
        let a = details_by_id(0x2e161069).unwrap();
        let b = details_by_id(0x2e161fff).unwrap();
        assert_eq!(a.part_number, "CY8C5888LTI-LP097");
        assert_eq!(a.flash_kb, 256);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn unknown_silicon_id_is_none() {
        assert!(details_by_id(0x12345678).is_none());
    }

    #[test]
    fn protection_decodes_known_states_only() {
        assert_eq!(Protection::from_raw(0x1), Some(Protection::Open));
        assert_eq!(Protection::from_raw(0x4), Some(Protection::Kill));
        assert_eq!(Protection::from_raw(0x3), None);
    }
}
