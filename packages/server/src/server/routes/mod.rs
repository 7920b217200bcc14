// HTTP routes
pub mod availability;
pub mod classes;
pub mod credits;
pub mod health;
pub mod schedule;
pub mod vacations;

pub use availability::*;
pub use classes::*;
pub use credits::*;
pub use health::*;
pub use schedule::*;
pub use vacations::*;
