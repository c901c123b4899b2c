#[cfg(feature = "std")]
use common::errors::*;
#[cfg(feature = "std")]
use common::Fail;

/// Errors surfaced by this crate's control-transfer path.
///
/// Downstream crates commonly match on this via `e.downcast_ref::<usb::Error>()`
/// to decide whether a failure is something they can recover from (e.g. a
/// stall on an optional feature) rather than a fatal transport error.
#[cfg(feature = "std")]
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "No USB device matched the given selector")]
    NoSuchDevice,

    #[fail(display = "USB control transfer stalled")]
    TransferStalled,

    #[fail(display = "USB control transfer timed out")]
    Timeout,

    #[fail(display = "USB ioctl failed: {}", _0)]
    Io(String),
}

#[cfg(not(feature = "std"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    NoSuchDevice,
    TransferStalled,
    Timeout,
}
