//! Utilities shared by the Hibiki binaries and libraries.

pub mod logger;
pub mod time;
