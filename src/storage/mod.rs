// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::edgar::models::{CompanyIdentity, FilingCollection};
use crate::edgar::resolver::{TickerEntry, TickerTable};
use crate::utils::error::StorageError;

const TICKER_TABLE_FILE: &str = "company_tickers.json";

#[derive(Debug, Clone)]
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the cached ticker table.
    pub fn ticker_table_path(&self) -> PathBuf {
        self.base_dir.join(TICKER_TABLE_FILE)
    }

    /// Writes the ticker table as a JSON array of entries.
    pub fn save_ticker_table(&self, table: &TickerTable) -> Result<PathBuf, StorageError> {
        let file_path = self.ticker_table_path();

        let json = serde_json::to_string(table.entries())
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        // Write to a sibling file first so a crash never leaves half a table.
        let tmp_path = file_path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(StorageError::IoError)?;
        fs::rename(&tmp_path, &file_path).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} tickers to {}", table.len(), file_path.display());
        Ok(file_path)
    }

    /// Reads the cached ticker table. `Ok(None)` if nothing has been cached.
    pub fn load_ticker_table(&self) -> Result<Option<TickerTable>, StorageError> {
        let file_path = self.ticker_table_path();
        if !file_path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&file_path).map_err(StorageError::IoError)?;
        let entries: Vec<TickerEntry> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        tracing::debug!("Read {} cached tickers from {}", entries.len(), file_path.display());
        Ok(Some(TickerTable::from_entries(entries)))
    }

    /// Saves a filing listing with export metadata to
    /// `<base_dir>/<TICKER>/filings.json`.
    pub fn export_filings(
        &self,
        identity: &CompanyIdentity,
        filings: &FilingCollection,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(identity.ticker());

        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join("filings.json");

        let document = serde_json::json!({
            "ticker": identity.ticker(),
            "cik": identity.cik(),
            "company_name": identity.name(),
            "filing_count": filings.len(),
            "filings": filings.as_slice(),
            "export_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved {} filings to {}", filings.len(), file_path.display());

        Ok(file_path)
    }
}
