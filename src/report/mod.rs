//! Run outputs beyond the classification report: the heatmap and JSON summary

pub mod heatmap;
pub mod summary;

pub use heatmap::{HEATMAP_TITLE, Heatmap};
pub use summary::RunSummary;
