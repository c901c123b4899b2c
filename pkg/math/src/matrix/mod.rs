
pub mod dimension;
pub mod storage;
pub mod element;
pub mod base;
pub mod equality;
pub mod householder;
pub mod qr;
pub mod eigen;
pub mod svd;

pub use self::dimension::*;
pub use self::base::*;
