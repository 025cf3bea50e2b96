// src/lib.rs
//! Company filing catalog built on SEC EDGAR: resolve a ticker to its
//! registrant, list and filter its filings, and read the financial
//! statements attached to a filing.
pub mod edgar;
pub mod reports;
pub mod storage;
pub mod tabular;
pub mod utils;

pub use edgar::{
    filter, latest_periodic, CompanyFacts, CompanyIdentity, DateRange, EdgarClient, FactsStore,
    FilingCatalog, FilingCollection, FilingRecord, FilterCriteria, IdentifierResolver,
};
pub use tabular::{to_tabular, Table};
pub use utils::AppError;
