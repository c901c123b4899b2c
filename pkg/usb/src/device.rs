use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use common::errors::*;
use libc::O_RDWR;

use crate::ioctl;
use crate::SetupPacket;

/// An open handle to a USB device's `usbfs` node.
///
/// `Device` only knows how to do control transfers — see the crate-level
/// docs for why bulk/interrupt transfers are out of scope here.
pub struct Device {
    file: File,
}

impl Device {
    pub(crate) fn open_node(path: &std::path::Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(O_RDWR)
            .open(path)
            .map_err(|e| format_err!("Failed to open USB device node {:?}: {}", path, e))?;

        Ok(Self { file })
    }

    /// Issues one control OUT transfer (host to device). `setup.wLength` is
    /// set to `data.len()` automatically.
    pub fn write_control(&mut self, mut setup: SetupPacket, data: &[u8]) -> Result<()> {
        setup.bmRequestType &= !0x80;
        setup.wLength = data.len() as u16;

        let mut buf = data.to_vec();
        ioctl::control_transfer(self.file.as_raw_fd(), setup, &mut buf, CONTROL_TIMEOUT_MS)?;
        Ok(())
    }

    /// Issues one control IN transfer (device to host), filling as much of
    /// `data` as the device returned. Returns the number of bytes actually
    /// received — a short read is not an error.
    pub fn read_control(&mut self, mut setup: SetupPacket, data: &mut [u8]) -> Result<usize> {
        setup.bmRequestType |= 0x80;
        setup.wLength = data.len() as u16;

        ioctl::control_transfer(self.file.as_raw_fd(), setup, data, CONTROL_TIMEOUT_MS)
    }

    /// Issues a USBDEVFS_RESET, which causes the kernel to re-enumerate the
    /// device's configuration. Any debugWIRE-specific state the device holds
    /// (like the adapter's own bit-timing) is lost and must be recalibrated.
    pub fn reset(&mut self) -> Result<()> {
        ioctl::reset(self.file.as_raw_fd())
    }
}

const CONTROL_TIMEOUT_MS: u32 = 5000;
