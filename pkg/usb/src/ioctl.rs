//! Raw bindings for the subset of `<linux/usbdevfs.h>` this crate needs.
//!
//! Only `USBDEVFS_CONTROL` (control transfers) and `USBDEVFS_RESET` are
//! wired up; the rest of usbfs (bulk/iso/urb reaping, claiming interfaces)
//! is not needed by a vendor-request-only device like the debugWIRE
//! adapter.

use std::os::unix::io::RawFd;

use common::errors::*;
use nix::libc::c_uint;

/// Mirrors `struct usbdevfs_ctrltransfer`.
#[derive(Debug, Copy, Clone)]
#[repr(C)]
#[allow(non_snake_case)]
pub struct CtrlTransfer {
    pub bRequestType: u8,
    pub bRequest: u8,
    pub wValue: u16,
    pub wIndex: u16,
    pub wLength: u16,
    pub timeout: u32,
    pub data: *mut u8,
}

// #define USBDEVFS_CONTROL  _IOWR('U', 0, struct usbdevfs_ctrltransfer)
nix::ioctl_readwrite!(usbdevfs_control, b'U', 0, CtrlTransfer);

// #define USBDEVFS_RESET    _IO('U', 20)
nix::ioctl_none!(usbdevfs_reset, b'U', 20);

/// Issues one USBDEVFS_CONTROL ioctl.
///
/// `data` is read from for an OUT transfer (bit 7 of `bmRequestType` clear)
/// and written to for an IN transfer. Returns the number of bytes the kernel
/// actually transferred.
pub fn control_transfer(
    fd: RawFd,
    setup: crate::SetupPacket,
    data: &mut [u8],
    timeout_ms: u32,
) -> Result<usize> {
    let mut xfer = CtrlTransfer {
        bRequestType: setup.bmRequestType,
        bRequest: setup.bRequest,
        wValue: setup.wValue,
        wIndex: setup.wIndex,
        wLength: setup.wLength,
        timeout: timeout_ms,
        data: data.as_mut_ptr(),
    };

    let n = unsafe { usbdevfs_control(fd, &mut xfer) }.map_err(|e| map_nix_error(e))?;

    Ok(n as usize)
}

pub fn reset(fd: RawFd) -> Result<()> {
    unsafe { usbdevfs_reset(fd) }.map_err(|e| map_nix_error(e))?;
    Ok(())
}

fn map_nix_error(e: nix::Error) -> crate::Error {
    use nix::errno::Errno;

    match e {
        nix::Error::Sys(Errno::EPIPE) => crate::Error::TransferStalled,
        nix::Error::Sys(Errno::ETIMEDOUT) => crate::Error::Timeout,
        other => crate::Error::Io(other.to_string()),
    }
}
