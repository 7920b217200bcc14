pub mod book;
pub mod cancel;
pub mod reschedule;
pub mod status;

pub use book::*;
pub use cancel::*;
pub use reschedule::*;
pub use status::*;
