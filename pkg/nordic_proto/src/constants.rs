pub const RADIO_ADDRESS_SIZE: usize = 4;

pub type RadioAddress = [u8; RADIO_ADDRESS_SIZE];

pub const LINK_KEY_SIZE: usize = 16;

pub const LINK_IV_SIZE: usize = 5;
