// Lingora - Scheduling Core
//
// This crate provides the class scheduling and booking engine for the
// language-school platform: teacher availability, credit-funded bookings,
// cancellation/reschedule lifecycle, template expansion and vacations.
//
// Workflows are organized per-domain in domains/*

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
