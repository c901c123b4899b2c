//! Supplemental EEPROM and flash-page virtual-instruction scripts.
//!
//! Kept separate from the hard transport core: these build on
//! exactly the same encoder + frame-buffer primitives as the SRAM/register
//! paths, with no new USB transaction shapes, but aren't exercised by the
//! connect/trace/go happy path. This module does not attempt page erase,
//! chip erase, or fuse handling — only the byte/word-level read and
//! single-location write primitives the virtual-instruction trick actually
//! needs.
//!
//! Two general-purpose registers (r0, r1) are used as scratch space by
//! every routine here; callers must not rely on their contents surviving a
//! call into this module.

use common::errors::*;

use crate::adapter::BULK_ACCESS_TIMERS_OFF;
use crate::encoder::{self, MODE_READ_FLASH};
use crate::port::UsbPort;
use crate::session::Session;

const SCRATCH_LO: u8 = 0;
const SCRATCH_HI: u8 = 1;

/// Classic AVR EEPROM controller I/O addresses (ATtiny/ATmega-family).
const EECR: u8 = 0x1C;
const EEDR: u8 = 0x1D;
const EEARL: u8 = 0x1E;
const EEARH: u8 = 0x1F;

const EEMWE: u8 = 1 << 2;
const EEWE: u8 = 1 << 1;
const EERE: u8 = 1 << 0;

fn write_ioreg_const<P: UsbPort>(session: &mut Session<P>, ioreg: u8, value: u8) -> Result<()> {
    session.set_reg(SCRATCH_LO, value)?;
    session.frame_mut().push(&encoder::avr_out(ioreg, SCRATCH_LO))
}

fn read_ioreg<P: UsbPort>(session: &mut Session<P>, ioreg: u8) -> Result<u8> {
    session
        .frame_mut()
        .push(&encoder::avr_in(SCRATCH_LO, ioreg))?;
    let part = session.require_part()?;
    session
        .frame_mut()
        .push(&encoder::avr_out(part.dwdr_ioreg, SCRATCH_LO))?;
    let bytes = session.frame_mut().receive(1)?;
    Ok(bytes[0])
}

/// Reads one EEPROM byte at `addr`: programs the address
/// register, strobes `EERE`, then reads `EEDR` back out through DWDR.
pub fn eeprom_read_byte<P: UsbPort>(session: &mut Session<P>, addr: u16) -> Result<u8> {
    write_ioreg_const(session, EEARL, addr as u8)?;
    write_ioreg_const(session, EEARH, (addr >> 8) as u8)?;
    write_ioreg_const(session, EECR, EERE)?;
    read_ioreg(session, EEDR)
}

/// Writes one EEPROM byte at `addr`. The caller is responsible for waiting
/// out the EEPROM's write cycle afterwards — there is no busy-wait
/// primitive at this layer.
pub fn eeprom_write_byte<P: UsbPort>(session: &mut Session<P>, addr: u16, value: u8) -> Result<()> {
    write_ioreg_const(session, EEARL, addr as u8)?;
    write_ioreg_const(session, EEARH, (addr >> 8) as u8)?;
    write_ioreg_const(session, EEDR, value)?;
    write_ioreg_const(session, EECR, EEMWE)?;
    write_ioreg_const(session, EECR, EEWE)
}

/// Reads one flash page of `page_size` bytes starting at the word address
/// `addr_word`, via the same Z-post-increment bulk-transfer framing as
/// `read_addr`'s direct reads, but with the flash-read mode nibble.
pub fn flash_read_page<P: UsbPort>(
    session: &mut Session<P>,
    addr_word: u16,
    page_size: u16,
) -> Result<Vec<u8>> {
    session.set_z(addr_word * 2)?;
    session.frame_mut().push(&encoder::set_pc(0))?;
    session
        .frame_mut()
        .push(&encoder::set_bp(2 * page_size))?;
    session.frame_mut().push(&[BULK_ACCESS_TIMERS_OFF])?;
    session
        .frame_mut()
        .push(&encoder::mode_select(MODE_READ_FLASH))?;
    session
        .frame_mut()
        .push(&[encoder::STEP_MICROPROGRAM])?;
    session.frame_mut().receive(page_size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::test_support::MockPort;

    fn connected_session() -> Session<MockPort> {
        let mut session = Session::new(MockPort::new());
        session.set_part_for_test(catalog::lookup(0x930B).unwrap());
        session
    }

    #[test]
    fn eeprom_read_byte_reads_edr_back_through_dwdr() {
        let mut session = connected_session();
        session.frame_mut().adapter().port.queue_raw(vec![0x42]);

        let value = eeprom_read_byte(&mut session, 0x0010).unwrap();
        assert_eq!(value, 0x42);
    }

    #[test]
    fn flash_read_page_returns_requested_byte_count() {
        let mut session = connected_session();
        session
            .frame_mut()
            .adapter()
            .port
            .queue_raw(vec![0xEE; 64]);

        let page = flash_read_page(&mut session, 0, 64).unwrap();
        assert_eq!(page.len(), 64);
        assert!(page.iter().all(|&b| b == 0xEE));
    }
}
