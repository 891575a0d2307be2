//! Orrery Core
//!
//! Shared utilities for the Orrery crates: hash collections, logging setup and profiling hooks.

pub mod alloc;
pub mod logging;
pub mod profiling;
