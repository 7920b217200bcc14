pub mod actions;
pub mod effects;
pub mod error;
pub mod policy;

pub use actions::*;
pub use error::SchedulingError;
