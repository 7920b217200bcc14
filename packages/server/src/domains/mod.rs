pub mod availability;
pub mod classes;
pub mod credits;
pub mod scheduling;
pub mod students;
pub mod teachers;
pub mod templates;
pub mod vacations;
