//! Loading and labelling of the patient table
//!
//! The loader reads the CSV into a [`RawTable`]; the labeler derives the
//! severity band and produces a typed [`LabeledTable`].

pub mod labeler;
pub mod loader;
pub mod table;

pub use labeler::{CohortSummary, LabeledTable, Severity, label_records};
pub use loader::{REQUIRED_COLUMNS, load_csv, read_csv};
pub use table::{Column, ColumnData, Dataset, FeatureMatrix, RawTable, class_counts};
