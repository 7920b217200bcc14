pub mod exception;
pub mod slot;

pub use exception::*;
pub use slot::*;
