//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for stage logging and progress tracking.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{
    log_operation_complete, log_operation_start, log_stage_complete, log_stage_start, log_warning,
};
pub use progress::{create_main_progress_bar, create_progress_bar, finish_progress_bar};
