//! Logging utilities
//!
//! This module provides standardized logging functions for pipeline stages.

use std::path::Path;
use std::time::Duration;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file being operated on
pub fn log_operation_start(operation: &str, path: &Path) {
    log::info!("{} {}", operation, path.display());
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `path` - Path of the file that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!(
            "Successfully {} {} rows from {} in {:?}",
            operation,
            items,
            path.display(),
            duration
        );
    } else {
        log::info!("Successfully {} {} rows from {}", operation, items, path.display());
    }
}

/// Log the start of a pipeline stage
pub fn log_stage_start(stage: &str, detail: &str) {
    log::info!("[{stage}] {detail}");
}

/// Log the completion of a pipeline stage
///
/// # Arguments
/// * `stage` - Stage name
/// * `items` - Number of rows or fits the stage produced
/// * `elapsed` - Time spent in the stage
pub fn log_stage_complete(stage: &str, items: usize, elapsed: Duration) {
    log::info!("[{stage}] completed with {items} items in {elapsed:?}");
}

/// Log a warning, optionally tied to a path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}
