//! Core business logic for ballotbox.

pub mod services;

pub use services::*;
