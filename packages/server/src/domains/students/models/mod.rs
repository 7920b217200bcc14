pub mod student;

pub use student::*;
