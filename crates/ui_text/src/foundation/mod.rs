//! Foundation utilities shared by the text subsystem
//!
//! Math aliases, logging setup and handle storage.

pub mod collections;
pub mod logging;
pub mod math;
