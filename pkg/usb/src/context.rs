use std::fs;
use std::path::PathBuf;

use common::errors::*;

use crate::device::Device;

/// Entry point for finding USB devices. Unlike a libusb context, this holds
/// no OS resources itself — device discovery just walks `/sys/bus/usb/devices`.
pub struct Context {}

/// One USB device as seen in `/sys/bus/usb/devices`, before it is opened.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub bus_num: u32,
    pub dev_num: u32,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceDescriptor {
    fn node_path(&self) -> PathBuf {
        PathBuf::from(format!(
            "/dev/bus/usb/{:03}/{:03}",
            self.bus_num, self.dev_num
        ))
    }

    pub fn open(&self) -> Result<Device> {
        Device::open_node(&self.node_path())
    }
}

/// A filter used to pick one device out of everything enumerated on the bus.
///
/// This intentionally only matches on vendor/product ID: the debugWIRE
/// adapter is a single well-known VID:PID pair, and there is no need for
/// glob/regex matching over serial numbers or bus topology the way some of
/// this workspace's other USB device drivers do.
#[derive(Debug, Clone, Copy)]
pub struct DeviceSelector {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceSelector {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, dev: &DeviceDescriptor) -> bool {
        dev.vendor_id == self.vendor_id && dev.product_id == self.product_id
    }
}

impl Context {
    pub fn create() -> Result<Self> {
        Ok(Self {})
    }

    pub fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut out = vec![];

        let entries = match fs::read_dir("/sys/bus/usb/devices") {
            Ok(e) => e,
            // No usb sysfs mounted (e.g. in a sandboxed test environment):
            // report no devices rather than failing enumeration outright.
            Err(_) => return Ok(out),
        };

        for entry in entries {
            let entry = entry.map_err(|e| format_err!("Failed to read USB sysfs entry: {}", e))?;
            let dir = entry.path();

            let bus_num = match read_sysfs_u32(&dir.join("busnum")) {
                Some(v) => v,
                None => continue,
            };
            let dev_num = match read_sysfs_u32(&dir.join("devnum")) {
                Some(v) => v,
                None => continue,
            };
            let vendor_id = match read_sysfs_hex_u16(&dir.join("idVendor")) {
                Some(v) => v,
                None => continue,
            };
            let product_id = match read_sysfs_hex_u16(&dir.join("idProduct")) {
                Some(v) => v,
                None => continue,
            };

            out.push(DeviceDescriptor {
                bus_num,
                dev_num,
                vendor_id,
                product_id,
            });
        }

        Ok(out)
    }

    /// Convenience for the common case of "there's exactly one matching
    /// device, open it".
    pub fn open_device(&self, selector: &DeviceSelector) -> Result<Device> {
        let matching = self
            .enumerate_devices()?
            .into_iter()
            .find(|d| selector.matches(d))
            .ok_or_else(|| Error::from(crate::Error::NoSuchDevice))?;

        matching.open()
    }
}

fn read_sysfs_u32(path: &std::path::Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn read_sysfs_hex_u16(path: &std::path::Path) -> Option<u16> {
    u16::from_str_radix(fs::read_to_string(path).ok()?.trim(), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_on_vid_pid_only() {
        let selector = DeviceSelector::new(0x1781, 0x0c9f);

        let dev = DeviceDescriptor {
            bus_num: 3,
            dev_num: 12,
            vendor_id: 0x1781,
            product_id: 0x0c9f,
        };
        assert!(selector.matches(&dev));

        let other = DeviceDescriptor {
            vendor_id: 0x0483,
            ..dev
        };
        assert!(!selector.matches(&other));
    }
}
