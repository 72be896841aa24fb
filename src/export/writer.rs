//! JSON dataset file writer and reader.
//!
//! One file per run, keyed by category name in catalog order. The file is
//! written to a temporary sibling and renamed into place, so readers never
//! observe a partial dataset.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tempfile::NamedTempFile;

use crate::categories::Category;
use crate::dataset::{AnswerPair, PromptVariant, RecordRow};
use crate::error::ExportError;
use crate::pipeline::{CategoryReport, CategoryStats, GenerationRun};

/// File name prefix of every dataset file.
pub const FILE_PREFIX: &str = "synthetic_prompts_";

// ============================================================================
// Document Types
// ============================================================================

/// One category's entry in the dataset file.
///
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    /// Traditional prompts.
    pub prompt_format: Vec<String>,
    /// Answer pairs aligned by index with `prompt_format`.
    pub name_pairs: Vec<AnswerPair>,
    pub description: String,
    /// Forking prompts.
    pub forking_format: Vec<String>,
    /// Per-placeholder pairs aligned with `forking_format`.
    pub forking_placeholder_pairs: Vec<Vec<AnswerPair>>,
    /// Forking indices aligned with `forking_format`.
    pub forking_indices: Vec<Vec<usize>>,
    /// Every record, seeds first.
    #[serde(rename = "_rows")]
    pub rows: Vec<RecordRow>,
    pub metadata: CategoryStats,
}

impl CategorySection {
    pub fn from_report(report: &CategoryReport) -> Self {
        let mut section = Self {
            prompt_format: Vec::new(),
            name_pairs: Vec::new(),
            description: report.description.clone(),
            forking_format: Vec::new(),
            forking_placeholder_pairs: Vec::new(),
            forking_indices: Vec::new(),
            rows: Vec::with_capacity(report.records.len()),
            metadata: report.stats.clone(),
        };

        for record in &report.records {
            match &record.variant {
                PromptVariant::Traditional { answer, .. } => {
                    section.prompt_format.push(record.prompt.clone());
                    section.name_pairs.push(answer.clone());
                }
                PromptVariant::Forking {
                    placeholder_pairs,
                    forking_index,
                } => {
                    section.forking_format.push(record.prompt.clone());
                    section
                        .forking_placeholder_pairs
                        .push(placeholder_pairs.clone());
                    section.forking_indices.push(vec![*forking_index]);
                }
            }
            section.rows.push(record.to_row());
        }

        section
    }
}

/// Ordered category map; serialized as a JSON object in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetDocument {
    pub categories: Vec<(Category, CategorySection)>,
}

impl DatasetDocument {
    pub fn from_run(run: &GenerationRun) -> Self {
        Self {
            categories: run
                .reports
                .iter()
                .map(|report| (report.category, CategorySection::from_report(report)))
                .collect(),
        }
    }

    pub fn get(&self, category: Category) -> Option<&CategorySection> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, section)| section)
    }

    pub fn total_rows(&self) -> usize {
        self.categories.iter().map(|(_, s)| s.rows.len()).sum()
    }
}

impl Serialize for DatasetDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, section) in &self.categories {
            map.serialize_entry(category.as_str(), section)?;
        }
        map.end()
    }
}

// ============================================================================
// Export Result
// ============================================================================

/// Result of a dataset write.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub categories: usize,
    pub rows: usize,
    pub written_at: DateTime<Utc>,
}

// ============================================================================
// Writer
// ============================================================================

/// `synthetic_prompts_<YYYYMMDDTHHMMSSZ>.json`
pub fn dataset_file_name(at: DateTime<Utc>) -> String {
    format!("{}{}.json", FILE_PREFIX, at.format("%Y%m%dT%H%M%SZ"))
}

/// Writes run results into an output directory.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    output_dir: PathBuf,
}

impl DatasetWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `run` to a new timestamped file.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the directory cannot be created or the file
    /// cannot be written. Nothing is left behind on failure.
    pub fn write(&self, run: &GenerationRun) -> Result<ExportSummary, ExportError> {
        self.write_document(&DatasetDocument::from_run(run), Utc::now())
    }

    /// Write a prepared document with an explicit timestamp.
    pub fn write_document(
        &self,
        document: &DatasetDocument,
        at: DateTime<Utc>,
    ) -> Result<ExportSummary, ExportError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| ExportError::OutputDirectory {
            path: self.output_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let path = self.output_dir.join(dataset_file_name(at));

        let temp = NamedTempFile::new_in(&self.output_dir).map_err(|e| {
            ExportError::OutputDirectory {
                path: self.output_dir.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(&path).map_err(|e| ExportError::PersistFailed {
            path: path.display().to_string(),
            reason: e.error.to_string(),
        })?;

        let summary = ExportSummary {
            path,
            categories: document.categories.len(),
            rows: document.total_rows(),
            written_at: at,
        };

        tracing::info!(
            path = %summary.path.display(),
            categories = summary.categories,
            rows = summary.rows,
            "Dataset written"
        );

        Ok(summary)
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Reads a dataset file written by [`DatasetWriter`].
///
/// Categories come back in catalog order.
///
/// # Errors
///
/// Returns `ExportError::InvalidFormat` for unknown category keys and
/// `ExportError::Json` when a section does not match the schema.
pub fn load_dataset(path: &Path) -> Result<DatasetDocument, ExportError> {
    let content = fs::read_to_string(path)?;
    let raw: HashMap<String, CategorySection> = serde_json::from_str(&content)?;

    let mut categories = Vec::with_capacity(raw.len());
    for (name, section) in raw {
        let category = name
            .parse::<Category>()
            .map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
        categories.push((category, section));
    }
    categories.sort_by_key(|(category, _)| *category);

    Ok(DatasetDocument { categories })
}
