// src/edgar/testing.rs
// In-memory fetcher and fixtures shared by the unit tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::json;

use crate::edgar::client::Fetch;
use crate::edgar::models::{CompanyIdentity, FilingRecord};
use crate::utils::error::FetchError;

pub const TEST_AGENT: &str = "Test Suite tests@example.com";

pub const TICKERS_JSON: &str = r#"{
    "0": {"cik_str": 2488, "ticker": "AMD", "title": "ADVANCED MICRO DEVICES INC"},
    "1": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
    "2": {"cik_str": "753308", "ticker": "NEE", "title": "NEXTERA ENERGY INC"},
    "3": {"cik_str": "not-a-number", "ticker": "BAD", "title": "Broken Row"},
    "4": {"ticker": "NOCIK", "title": "Missing identifier"},
    "5": {"cik_str": 999999, "ticker": "AMD", "title": "Later duplicate"}
}"#;

/// Serves canned bodies by URL and records every request.
#[derive(Debug, Clone)]
pub struct StubFetcher {
    user_agent: String,
    responses: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            user_agent: TEST_AGENT.to_string(),
            responses: HashMap::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn hits(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for StubFetcher {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses.get(url).cloned().ok_or_else(|| FetchError::Http {
            status: reqwest::StatusCode::NOT_FOUND,
            url: url.to_string(),
        })
    }
}

pub fn identity(ticker: &str, cik: u64, name: &str) -> Arc<CompanyIdentity> {
    Arc::new(CompanyIdentity::new(ticker, cik, name).unwrap())
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

/// A record owned by a throwaway identity, for filter and table tests.
pub fn record(
    accession: &str,
    form: &str,
    filed: &str,
    reported: Option<&str>,
    xbrl: bool,
) -> FilingRecord {
    FilingRecord {
        accession_number: accession.to_string(),
        filing_date: date(filed),
        report_date: reported.map(date),
        form_type: form.to_string(),
        is_xbrl: xbrl,
        is_inline_xbrl: xbrl,
        primary_document: format!("{}.htm", accession),
        items: None,
        owner: identity("AMD", 2488, "ADVANCED MICRO DEVICES INC"),
    }
}

/// One row of a submissions fixture: accession, filed, reported, form, xbrl.
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str, u8);

/// Parallel arrays in the shape of `filings.recent` (and archived pages).
pub fn page_json(rows: &[Row<'_>]) -> serde_json::Value {
    json!({
        "accessionNumber": rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "filingDate": rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "reportDate": rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        "acceptanceDateTime": rows.iter().map(|r| format!("{}T16:05:00.000Z", r.1)).collect::<Vec<_>>(),
        "form": rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        "items": rows.iter().map(|_| "").collect::<Vec<_>>(),
        "isXBRL": rows.iter().map(|r| r.4).collect::<Vec<_>>(),
        "isInlineXBRL": rows.iter().map(|r| r.4).collect::<Vec<_>>(),
        "primaryDocument": rows.iter().enumerate().map(|(i, _)| format!("doc{}.htm", i)).collect::<Vec<_>>(),
    })
}

pub fn submissions_json(name: &str, rows: &[Row<'_>], files: &[&str]) -> String {
    let files: Vec<_> = files
        .iter()
        .map(|f| json!({"name": f, "filingCount": 1, "filingFrom": "2001-01-01", "filingTo": "2010-12-31"}))
        .collect();
    json!({
        "cik": "2488",
        "name": name,
        "tickers": ["AMD"],
        "filings": { "recent": page_json(rows), "files": files },
    })
    .to_string()
}
