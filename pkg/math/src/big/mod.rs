mod int;
mod modulo;
mod secure;
mod uint;

pub use self::int::*;
pub use self::modulo::*;
pub use self::secure::*;
pub use self::uint::*;
