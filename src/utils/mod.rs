//! Shared utilities

pub mod io;
pub mod logger;
pub mod timer;
