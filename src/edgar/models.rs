// src/edgar/models.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::edgar::client::filing_base_url;
use crate::utils::error::EdgarError;

/// Width of a rendered company identifier (CIK). The submissions API only
/// accepts this exact width.
pub const CIK_WIDTH: usize = 10;
const MAX_CIK: u64 = 9_999_999_999;

/// Trims and upper-cases a ticker symbol.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Structure representing the EDGAR company submission index.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
///
/// Only the fields the catalog reads are declared.
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsPage,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// An older page of filings, fetched separately.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingFile {
    pub name: String,
    #[serde(default)]
    pub filing_count: u32,
    #[serde(default)]
    pub filing_from: String,
    #[serde(default)]
    pub filing_to: String,
}

/// Parallel arrays, one entry per filing. Archived pages use the same shape
/// at their top level. Missing arrays deserialize as empty and are caught by
/// the length check during normalization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsPage {
    #[serde(default)]
    pub accession_number: Vec<String>,
    #[serde(default)]
    pub filing_date: Vec<String>,
    #[serde(default)]
    pub report_date: Vec<String>,
    #[serde(default)]
    pub form: Vec<String>,
    #[serde(default, rename = "isXBRL")]
    pub is_xbrl: Vec<i64>,
    #[serde(default, rename = "isInlineXBRL")]
    pub is_inline_xbrl: Vec<i64>,
    #[serde(default)]
    pub primary_document: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// A resolved company. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CompanyIdentity {
    ticker: String,
    cik: String,
    name: String,
}

impl CompanyIdentity {
    /// Fails with `DataIntegrity` if the identifier does not fit in
    /// `CIK_WIDTH` digits.
    pub fn new(ticker: &str, cik: u64, name: &str) -> Result<Self, EdgarError> {
        if cik > MAX_CIK {
            return Err(EdgarError::DataIntegrity(format!(
                "identifier {} for {} is wider than {} digits",
                cik, ticker, CIK_WIDTH
            )));
        }
        Ok(Self {
            ticker: normalize_ticker(ticker),
            cik: format!("{:0width$}", cik, width = CIK_WIDTH),
            name: name.trim().to_string(),
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Zero-padded, always `CIK_WIDTH` characters.
    pub fn cik(&self) -> &str {
        &self.cik
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One filing, normalized from a column of the submissions arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingRecord {
    pub accession_number: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
    pub form_type: String,
    pub is_xbrl: bool,
    pub is_inline_xbrl: bool,
    pub primary_document: String,
    pub items: Option<String>,
    /// Back-reference to the company the filing belongs to.
    #[serde(skip)]
    pub owner: Arc<CompanyIdentity>,
}

impl FilingRecord {
    /// Accession number with hyphens stripped, as used in archive paths.
    pub fn accession_compact(&self) -> String {
        self.accession_number.replace('-', "")
    }

    /// Directory of this filing in the EDGAR archive.
    pub fn base_url(&self) -> String {
        filing_base_url(self.owner.cik(), &self.accession_compact())
    }

    /// Constructs the URL to access the primary document of this filing
    pub fn primary_doc_url(&self) -> String {
        format!("{}/{}", self.base_url(), self.primary_document)
    }

    pub fn summary_url(&self) -> String {
        format!("{}/FilingSummary.xml", self.base_url())
    }
}

/// Filings in the registry's native order (most recent first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilingCollection {
    records: Vec<FilingRecord>,
}

impl FilingCollection {
    pub fn new(records: Vec<FilingRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&FilingRecord> {
        self.records.first()
    }

    pub fn get(&self, index: usize) -> Option<&FilingRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilingRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[FilingRecord] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<FilingRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a FilingCollection {
    type Item = &'a FilingRecord;
    type IntoIter = std::slice::Iter<'a, FilingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<FilingRecord> for FilingCollection {
    fn from_iter<I: IntoIterator<Item = FilingRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
