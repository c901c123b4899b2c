pub const CONNECTION: &'static [u8] = b"Connection";

pub const KEEP_ALIVE: &'static [u8] = b"Keep-Alive";

pub const TRANSFER_ENCODING: &'static [u8] = b"Transfer-Encoding";

pub const CONTENT_LENGTH: &'static [u8] = b"Content-Length";

pub const CONTENT_ENCODING: &'static [u8] = b"Content-Encoding";

pub const CONTENT_TYPE: &'static [u8] = b"Content-Type";
