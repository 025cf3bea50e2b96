// src/reports/mod.rs
pub mod index;
pub mod loader;
pub mod ratio;
pub mod statement;

pub use index::{ReportIndex, ReportRef};
pub use loader::{fetch_report_index, fetch_statement, load_financials};
pub use ratio::{FailurePolicy, RatioCalculator, RatioLabels};
pub use statement::{Financials, LineItem, LineItemSource, Statement};
