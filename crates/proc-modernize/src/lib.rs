//! Library side of the `proc-modernize` driver.
//!
//! Exposes the command implementations and output types so they can be
//! exercised without spawning the binary.

pub mod commands;
pub mod output;
