//! Utility functions for error handling
//!
//! Helpers that turn filesystem failures into `PipelineError`s carrying the
//! path and a hint about what went wrong.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Open an input file, reporting missing paths and directories explicitly
///
/// # Arguments
/// * `path` - The path to the file to open
///
/// # Returns
/// * `Result<fs::File>` - The opened file or an `Io` error naming the path
pub fn open_input_file(path: &Path) -> Result<fs::File> {
    if !path.exists() {
        return Err(PipelineError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        ));
    }

    if !path.is_file() {
        return Err(PipelineError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path is not a file"),
        ));
    }

    fs::File::open(path).map_err(|e| PipelineError::io(path, e))
}

/// Create (or truncate) an output file
pub fn create_output_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
    }
    fs::File::create(path).map_err(|e| PipelineError::io(path, e))
}
