// src/reports/loader.rs
use crate::edgar::client::Fetch;
use crate::edgar::models::FilingRecord;
use crate::reports::index::{ReportIndex, ReportRef};
use crate::reports::statement::{Financials, Statement};
use crate::utils::error::{EdgarError, ReportError};

/// Names under which filers publish the income statement.
pub const INCOME_STATEMENT_NAMES: [&str; 5] = [
    "Consolidated Statements of Operations",
    "Consolidated Statements of Income",
    "Statements of Operations",
    "Income Statements",
    "Statements of Earnings",
];

pub const BALANCE_SHEET_NAMES: [&str; 4] = [
    "Consolidated Balance Sheets",
    "Balance Sheets",
    "Statements of Financial Position",
    "Statement of Financial Condition",
];

/// Downloads and parses the `FilingSummary.xml` of `record`.
pub async fn fetch_report_index<F: Fetch>(
    fetcher: &F,
    record: &FilingRecord,
) -> Result<ReportIndex, ReportError> {
    let url = record.summary_url();
    tracing::info!(
        "Fetching report index for {} {} ({})",
        record.form_type,
        record.accession_number,
        url
    );
    let xml = fetcher.fetch_text(&url).await.map_err(EdgarError::from)?;
    ReportIndex::parse(&xml, &record.base_url())
}

pub async fn fetch_statement<F: Fetch>(
    fetcher: &F,
    report: &ReportRef,
) -> Result<Statement, ReportError> {
    tracing::debug!("Fetching statement {:?} from {}", report.short_name, report.url);
    let html = fetcher.fetch_text(&report.url).await.map_err(EdgarError::from)?;
    Statement::parse(&html, &report.url)
}

/// Loads the income statement and balance sheet listed in `index`.
///
/// Fails with `ReportNotFound` when the index has no report under any of the
/// known names for either statement.
pub async fn load_financials<F: Fetch>(
    fetcher: &F,
    index: &ReportIndex,
) -> Result<Financials, ReportError> {
    let groups: [(&str, &[&str]); 2] = [
        ("income statement", &INCOME_STATEMENT_NAMES),
        ("balance sheet", &BALANCE_SHEET_NAMES),
    ];

    let mut statements = Vec::with_capacity(groups.len());
    for (kind, names) in groups {
        let report = index
            .find_any(names)
            .ok_or_else(|| ReportError::ReportNotFound(format!("{} in {}", kind, index.base_url())))?;
        statements.push(fetch_statement(fetcher, report).await?);
    }

    tracing::info!("Loaded {} statements from {}", statements.len(), index.base_url());
    Ok(Financials::new(statements))
}
