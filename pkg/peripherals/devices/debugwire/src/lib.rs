//! Host-side debugWIRE debugger core: adapter transport, command encoder,
//! and target session, tunnelled through a USB-attached LittleWire/Digispark
//! gateway.
//!
//! This crate is the transport and command layer only. A GDB-remote bridge,
//! ELF loader, and flash page programmer are expected to sit on top of
//! [`Session`] rather than inside it.

pub mod adapter;
pub mod backoff;
pub mod catalog;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod port;
pub mod scripts;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::PartInfo;
pub use error::Error;
pub use port::{LittleWirePort, UsbPort};
pub use session::Session;

/// Opens the first attached LittleWire/Digispark gateway and connects to
/// whatever target is attached to it.
pub fn connect() -> common::errors::Result<Session<LittleWirePort>> {
    let port = LittleWirePort::open()?;
    let mut session = Session::new(port);
    session.connect()?;
    Ok(session)
}
