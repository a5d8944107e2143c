// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::ExtractionRecord;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    // Records are grouped by internal document type: /base_dir/<type>/
    fn target_dir(&self, record: &ExtractionRecord) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(&record.classification.document_type_internal);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Saves the extraction record as pretty JSON
    pub fn save_record(&self, record: &ExtractionRecord, stem: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(record)?.join(format!("{}_extraction.json", stem));

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved extraction to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves run metadata next to the record
    pub fn save_metadata(
        &self,
        record: &ExtractionRecord,
        stem: &str,
        document_id: Option<&str>,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.target_dir(record)?.join(format!("{}_meta.json", stem));

        let metadata = serde_json::json!({
            "document_id": document_id,
            "filename": filename,
            "document_type": record.classification.document_type_internal,
            "confidence_score": record.classification.confidence_score,
            "tax_year": record.tax_year,
            "red_flag_count": record.red_flags.len(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}
