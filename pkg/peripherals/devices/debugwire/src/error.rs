use common::errors::*;
use common::Fail;

/// The four fatal error kinds the debugWIRE core can raise. Every one of
/// them tears down the adapter connection — there is no partial-recovery
/// path inside this crate, the caller must re-`connect`.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "debugWIRE transport failed: {}", _0)]
    Transport(String),

    #[fail(display = "debugWIRE baud calibration failed: {}", _0)]
    Calibration(String),

    #[fail(display = "Unrecognized device signature: {:#06x}", _0)]
    UnknownSignature(u16),

    #[fail(display = "debugWIRE protocol assertion failed: {}", _0)]
    Protocol(String),
}

pub fn protocol_error<T>(message: &str) -> Result<T> {
    Err(Error::Protocol(message.to_string()).into())
}
