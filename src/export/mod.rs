//! Dataset export.
//!
//! Provides the single-file JSON dataset writer and its reader.

pub mod writer;

pub use writer::{
    dataset_file_name, load_dataset, CategorySection, DatasetDocument, DatasetWriter,
    ExportSummary, FILE_PREFIX,
};
