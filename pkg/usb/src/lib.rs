//! Minimal host-side USB control-transfer facade, built directly on the
//! Linux `usbfs` ioctl interface (no libusb dependency).
//!
//! This crate is intentionally narrow: it gives a `Device` handle that can
//! issue control transfers (the only transfer type any current user of this
//! crate needs) and a `Context` that can find a device by vendor/product ID.
//! Bulk/interrupt transfers, descriptor parsing and hotplug notifications are
//! not implemented here; add them if a future device driver needs them.

#[cfg(feature = "std")]
extern crate common;
#[cfg(feature = "std")]
extern crate libc;
#[cfg(feature = "std")]
extern crate nix;

#[cfg(feature = "std")]
mod context;
#[cfg(feature = "std")]
mod device;
mod error;
#[cfg(feature = "std")]
mod ioctl;
mod setup;

#[cfg(feature = "std")]
pub use context::{Context, DeviceDescriptor, DeviceSelector};
#[cfg(feature = "std")]
pub use device::Device;
pub use error::Error;
pub use setup::SetupPacket;
