// src/edgar/mod.rs
pub mod cache;
pub mod catalog;
pub mod client;
pub mod facts;
pub mod filter;
pub mod models;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::FilingCatalog;
pub use client::{EdgarClient, Fetch};
pub use facts::{CompanyFacts, FactsStore};
pub use filter::{filter, latest_periodic, DateRange, FilterCriteria};
pub use models::{CompanyIdentity, FilingCollection, FilingRecord};
pub use resolver::{IdentifierResolver, TickerTable};
