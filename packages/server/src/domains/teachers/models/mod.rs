pub mod teacher;

pub use teacher::*;
