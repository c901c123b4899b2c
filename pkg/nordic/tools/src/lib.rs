#[macro_use]
extern crate common;
#[macro_use]
extern crate macros;

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

pub mod link_util;
pub mod radio_bridge;
pub mod usb_radio;
