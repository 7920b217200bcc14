pub mod class;
pub mod status;

pub use class::*;
pub use status::*;
