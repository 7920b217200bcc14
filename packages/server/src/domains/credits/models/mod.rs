pub mod credit;

pub use credit::*;
