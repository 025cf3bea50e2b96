// src/edgar/catalog.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::edgar::cache::Cached;
use crate::edgar::client::{fetch_json, submissions_page_url, submissions_url, Fetch};
use crate::edgar::models::{
    CompanyIdentity, CompanySubmission, FilingCollection, FilingRecord, FilingsPage,
};
use crate::utils::config::require_contact;
use crate::utils::error::EdgarError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fetches and caches each company's filing history.
///
/// Collections are cached per identity, not per CIK: tickers sharing a CIK
/// (share classes) each get records that point back to their own identity.
#[derive(Debug)]
pub struct FilingCatalog<F> {
    fetcher: F,
    include_archived: bool,
    cache: HashMap<CompanyIdentity, Cached<Arc<FilingCollection>>>,
}

impl<F: Fetch> FilingCatalog<F> {
    pub fn new(fetcher: F) -> Result<Self, EdgarError> {
        require_contact(fetcher.user_agent())?;
        Ok(Self {
            fetcher,
            include_archived: false,
            cache: HashMap::new(),
        })
    }

    /// Also fetch the archived pages listed under `filings.files`.
    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    /// Returns the filings for `identity`, fetching them on first use.
    pub async fn filings(
        &mut self,
        identity: &Arc<CompanyIdentity>,
    ) -> Result<Arc<FilingCollection>, EdgarError> {
        if let Some(collection) = self.cache.get(&**identity).and_then(Cached::get) {
            tracing::debug!("Serving cached filings for {}", identity.ticker());
            return Ok(Arc::clone(collection));
        }
        self.refresh(identity).await
    }

    /// Refetches the filings for `identity` and replaces the cached
    /// collection. On failure the previous collection stays cached.
    pub async fn refresh(
        &mut self,
        identity: &Arc<CompanyIdentity>,
    ) -> Result<Arc<FilingCollection>, EdgarError> {
        let collection = Arc::new(self.fetch_collection(identity).await?);
        self.cache
            .entry(CompanyIdentity::clone(identity))
            .or_default()
            .store(Arc::clone(&collection));
        Ok(collection)
    }

    pub fn invalidate(&mut self, identity: &CompanyIdentity) {
        if let Some(slot) = self.cache.get_mut(identity) {
            slot.reset();
        }
    }

    pub fn is_cached(&self, identity: &CompanyIdentity) -> bool {
        self.cache
            .get(identity)
            .is_some_and(Cached::is_fetched)
    }

    async fn fetch_collection(
        &self,
        identity: &Arc<CompanyIdentity>,
    ) -> Result<FilingCollection, EdgarError> {
        let url = submissions_url(identity.cik());
        tracing::info!("Fetching filings for {} (CIK {})", identity.ticker(), identity.cik());

        let submission: CompanySubmission = fetch_json(&self.fetcher, &url).await?;
        let today = chrono::Utc::now().date_naive();

        let mut records = normalize_page(&submission.filings.recent, identity, today)?;

        if self.include_archived {
            for file in &submission.filings.files {
                tracing::debug!(
                    "Fetching archived page {} ({} filings, {} to {})",
                    file.name,
                    file.filing_count,
                    file.filing_from,
                    file.filing_to
                );
                let page: FilingsPage =
                    fetch_json(&self.fetcher, &submissions_page_url(&file.name)).await?;
                records.extend(normalize_page(&page, identity, today)?);
            }
        }

        ensure_unique_accessions(&records)?;

        tracing::info!("Normalized {} filings for {}", records.len(), identity.ticker());
        Ok(FilingCollection::new(records))
    }
}

/// Zips the parallel arrays of one page into records, index by index.
///
/// Every array must have the same length as `accessionNumber`; a mismatch
/// means records would be misaligned, so the whole page is rejected.
pub fn normalize_page(
    page: &FilingsPage,
    owner: &Arc<CompanyIdentity>,
    today: NaiveDate,
) -> Result<Vec<FilingRecord>, EdgarError> {
    let expected = page.accession_number.len();
    let lengths = [
        ("filingDate", page.filing_date.len()),
        ("reportDate", page.report_date.len()),
        ("form", page.form.len()),
        ("isXBRL", page.is_xbrl.len()),
        ("isInlineXBRL", page.is_inline_xbrl.len()),
        ("primaryDocument", page.primary_document.len()),
        ("items", page.items.len()),
    ];

    for (field, len) in lengths {
        if len != expected {
            return Err(EdgarError::DataIntegrity(format!(
                "{} has {} entries but accessionNumber has {}",
                field, len, expected
            )));
        }
    }

    (0..expected)
        .map(|i| build_record(page, i, owner, today))
        .collect()
}

fn build_record(
    page: &FilingsPage,
    i: usize,
    owner: &Arc<CompanyIdentity>,
    today: NaiveDate,
) -> Result<FilingRecord, EdgarError> {
    let accession_number = page.accession_number[i].trim().to_string();
    if accession_number.is_empty() {
        return Err(EdgarError::DataIntegrity(format!("empty accession number at index {}", i)));
    }

    let filing_date = parse_date(&page.filing_date[i]).ok_or_else(|| {
        EdgarError::DataIntegrity(format!(
            "invalid filing date {:?} for {}",
            page.filing_date[i], accession_number
        ))
    })?;

    let report_date = match page.report_date[i].trim() {
        "" => None,
        raw => Some(parse_date(raw).ok_or_else(|| {
            EdgarError::DataIntegrity(format!(
                "invalid report date {:?} for {}",
                raw, accession_number
            ))
        })?),
    };

    if filing_date > today {
        return Err(EdgarError::DataIntegrity(format!(
            "filing date {} of {} is in the future",
            filing_date, accession_number
        )));
    }
    if let Some(reported) = report_date {
        if reported > filing_date {
            return Err(EdgarError::DataIntegrity(format!(
                "report date {} is after filing date {} for {} {}",
                reported, filing_date, page.form[i].trim(), accession_number
            )));
        }
    }

    let is_xbrl = parse_flag("isXBRL", page.is_xbrl[i], &accession_number)?;
    let is_inline_xbrl = parse_flag("isInlineXBRL", page.is_inline_xbrl[i], &accession_number)?;

    let items = page.items[i].trim();

    Ok(FilingRecord {
        form_type: page.form[i].trim().to_string(),
        primary_document: page.primary_document[i].trim().to_string(),
        items: (!items.is_empty()).then(|| items.to_string()),
        accession_number,
        filing_date,
        report_date,
        is_xbrl,
        is_inline_xbrl,
        owner: Arc::clone(owner),
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn parse_flag(field: &str, value: i64, accession: &str) -> Result<bool, EdgarError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(EdgarError::DataIntegrity(format!(
            "{} is {} for {}, expected 0 or 1",
            field, other, accession
        ))),
    }
}

fn ensure_unique_accessions(records: &[FilingRecord]) -> Result<(), EdgarError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.accession_compact()) {
            return Err(EdgarError::DataIntegrity(format!(
                "duplicate accession number {}",
                record.accession_number
            )));
        }
    }
    Ok(())
}
