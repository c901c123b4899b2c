extern crate protobuf;

#[macro_use]
extern crate macros;

mod build;
mod compiler;
mod primitive;
mod proto;
mod size;

pub use build::build;
