//! Shared utilities
//!
//! Logging helpers and progress bars used across pipeline stages.

pub mod logging;
