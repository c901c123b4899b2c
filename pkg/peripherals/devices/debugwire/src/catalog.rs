//! Static catalog of known target signatures.
//!
//! debugWIRE exposes no part-identification command beyond the 3-byte JTAG
//! signature already used by ISP programming, so connecting to an unknown
//! part means looking that signature up here.

use crate::error::Error;
use common::errors::*;

/// Everything the session needs to know about a target MCU besides its
/// current run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartInfo {
    pub signature: u16,
    pub name: &'static str,
    pub flash_size: u32,
    pub sram_base: u16,
    pub sram_size: u16,
    pub eeprom_size: u16,
    pub page_size: u16,
    /// Address of the `DWDR` I/O register (mapped into data space at
    /// `0x20 + ioreg`), which debugWIRE hijacks as its own transport and so
    /// must never be treated as ordinary SRAM.
    pub dwdr_addr: u16,
    pub dwdr_ioreg: u8,
}

/// Append-only; add an entry here rather than special-casing a part number
/// elsewhere.
static PARTS: &[PartInfo] = &[
    PartInfo {
        signature: 0x930B,
        name: "ATtiny85",
        flash_size: 8192,
        sram_base: 0x0060,
        sram_size: 512,
        eeprom_size: 512,
        page_size: 64,
        dwdr_addr: 0x002E,
        dwdr_ioreg: 0x0E,
    },
    PartInfo {
        signature: 0x9007,
        name: "ATtiny13",
        flash_size: 1024,
        sram_base: 0x0060,
        sram_size: 64,
        eeprom_size: 64,
        page_size: 32,
        dwdr_addr: 0x002E,
        dwdr_ioreg: 0x0E,
    },
    PartInfo {
        signature: 0x9205,
        name: "ATtiny25",
        flash_size: 2048,
        sram_base: 0x0060,
        sram_size: 128,
        eeprom_size: 128,
        page_size: 32,
        dwdr_addr: 0x002E,
        dwdr_ioreg: 0x0E,
    },
    PartInfo {
        signature: 0x930A,
        name: "ATtiny45",
        flash_size: 4096,
        sram_base: 0x0060,
        sram_size: 256,
        eeprom_size: 256,
        page_size: 64,
        dwdr_addr: 0x002E,
        dwdr_ioreg: 0x0E,
    },
    PartInfo {
        signature: 0x9314,
        name: "ATmega88",
        flash_size: 8192,
        sram_base: 0x0100,
        sram_size: 1024,
        eeprom_size: 512,
        page_size: 64,
        dwdr_addr: 0x0031,
        dwdr_ioreg: 0x11,
    },
    PartInfo {
        signature: 0x9406,
        name: "ATmega168",
        flash_size: 16384,
        sram_base: 0x0100,
        sram_size: 1024,
        eeprom_size: 512,
        page_size: 128,
        dwdr_addr: 0x0031,
        dwdr_ioreg: 0x11,
    },
];

pub fn lookup(signature: u16) -> Result<&'static PartInfo> {
    PARTS
        .iter()
        .find(|p| p.signature == signature)
        .ok_or_else(|| Error::UnknownSignature(signature).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_attiny85_by_signature() {
        let part = lookup(0x930B).unwrap();
        assert_eq!(part.name, "ATtiny85");
        assert_eq!(part.flash_size, 8192);
        assert_eq!(part.dwdr_addr, 0x002E);
    }

    #[test]
    fn rejects_an_unknown_signature() {
        let err = lookup(0xFFFF);
        assert!(err.is_err());
    }

    #[test]
    fn every_catalog_entry_has_a_unique_signature() {
        for (i, a) in PARTS.iter().enumerate() {
            for b in &PARTS[i + 1..] {
                assert_ne!(a.signature, b.signature);
            }
        }
    }
}
