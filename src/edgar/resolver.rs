// src/edgar/resolver.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::edgar::cache::Cached;
use crate::edgar::client::{Fetch, COMPANY_TICKERS_URL};
use crate::edgar::models::{normalize_ticker, CompanyIdentity};
use crate::storage::StorageManager;
use crate::utils::config::require_contact;
use crate::utils::error::{EdgarError, FetchError};

/// One row of the bulk ticker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub ticker: String,
    pub cik: u64,
    pub title: String,
}

/// Row as it appears in `company_tickers.json`.
#[derive(Debug, Deserialize)]
struct RawTickerEntry {
    cik_str: RawCik,
    ticker: String,
    #[serde(default)]
    title: String,
}

/// SEC serves the identifier as a number; older mirrors use a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCik {
    Number(u64),
    Text(String),
}

impl RawCik {
    fn value(&self) -> Option<u64> {
        match self {
            RawCik::Number(n) => Some(*n),
            RawCik::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Ticker -> identifier lookup table. The first row for a ticker wins.
#[derive(Debug, Clone, Default)]
pub struct TickerTable {
    entries: Vec<TickerEntry>,
    index: HashMap<String, usize>,
}

impl TickerTable {
    pub fn from_entries(entries: Vec<TickerEntry>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());

        for mut entry in entries {
            entry.ticker = normalize_ticker(&entry.ticker);
            if entry.ticker.is_empty() || index.contains_key(&entry.ticker) {
                continue;
            }
            index.insert(entry.ticker.clone(), kept.len());
            kept.push(entry);
        }

        Self { entries: kept, index }
    }

    /// Parses the body of `company_tickers.json`.
    ///
    /// The top level must be an object; rows that lack a ticker or carry a
    /// non-numeric identifier are skipped rather than failing the table.
    pub fn parse(body: &str, url: &str) -> Result<Self, FetchError> {
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(body).map_err(|e| FetchError::Malformed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // Keys are row numbers ("0", "1", ...); keep the registry's ranking.
        let mut rows: Vec<(String, serde_json::Value)> = raw.into_iter().collect();
        rows.sort_by_key(|(key, _)| key.parse::<u64>().unwrap_or(u64::MAX));

        let mut entries = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;

        for (key, value) in rows {
            let parsed = serde_json::from_value::<RawTickerEntry>(value)
                .ok()
                .and_then(|raw| Some((raw.cik_str.value()?, raw.ticker, raw.title)));

            match parsed {
                Some((cik, ticker, title)) if !ticker.trim().is_empty() => {
                    entries.push(TickerEntry { ticker, cik, title });
                }
                _ => {
                    tracing::trace!("Skipping malformed ticker row {}", key);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed rows in ticker table", skipped);
        }

        Ok(Self::from_entries(entries))
    }

    pub fn lookup(&self, ticker: &str) -> Option<&TickerEntry> {
        self.index
            .get(&normalize_ticker(ticker))
            .map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[TickerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves ticker symbols to company identities.
///
/// The ticker table is loaded once per resolver (from the on-disk cache when
/// one is configured, otherwise from SEC) and identities are memoized, so a
/// ticker resolves to the same `Arc` for the whole session.
#[derive(Debug)]
pub struct IdentifierResolver<F> {
    fetcher: F,
    storage: Option<StorageManager>,
    refresh: bool,
    table: Cached<Arc<TickerTable>>,
    identities: HashMap<String, Arc<CompanyIdentity>>,
}

impl<F: Fetch> IdentifierResolver<F> {
    /// Fails with `MissingPrecondition` if the fetcher has no contact string.
    pub fn new(fetcher: F) -> Result<Self, EdgarError> {
        require_contact(fetcher.user_agent())?;
        Ok(Self {
            fetcher,
            storage: None,
            refresh: false,
            table: Cached::Unfetched,
            identities: HashMap::new(),
        })
    }

    /// Cache the ticker table under `storage`. With `refresh` set, the first
    /// load ignores the cached copy and overwrites it.
    pub fn with_storage(mut self, storage: StorageManager, refresh: bool) -> Self {
        self.storage = Some(storage);
        self.refresh = refresh;
        self
    }

    /// Looks up `ticker` (trimmed, case-insensitive). A ticker that is not in
    /// the table yields `EdgarError::NotFound`.
    pub async fn resolve(&mut self, ticker: &str) -> Result<Arc<CompanyIdentity>, EdgarError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(EdgarError::NotFound(ticker));
        }

        if let Some(identity) = self.identities.get(&ticker) {
            return Ok(Arc::clone(identity));
        }

        let table = self.table().await?;
        let entry = table
            .lookup(&ticker)
            .ok_or_else(|| EdgarError::NotFound(ticker.clone()))?;

        let identity = Arc::new(CompanyIdentity::new(&entry.ticker, entry.cik, &entry.title)?);
        tracing::debug!("Resolved {} to CIK {}", ticker, identity.cik());

        self.identities.insert(ticker, Arc::clone(&identity));
        Ok(identity)
    }

    /// Fetches a fresh table from SEC, replacing the one in memory (and on
    /// disk, if storage is configured). Returns the number of entries.
    pub async fn refresh_table(&mut self) -> Result<usize, EdgarError> {
        let table = Arc::new(self.fetch_table().await?);
        let len = table.len();
        self.table.store(table);
        Ok(len)
    }

    pub fn table_loaded(&self) -> bool {
        self.table.is_fetched()
    }

    async fn table(&mut self) -> Result<Arc<TickerTable>, EdgarError> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }

        let table = match self.cached_table() {
            Some(table) => table,
            None => self.fetch_table().await?,
        };

        let table = Arc::new(table);
        self.table.store(Arc::clone(&table));
        Ok(table)
    }

    /// Reads the on-disk copy. Any problem with it is a cache miss.
    fn cached_table(&self) -> Option<TickerTable> {
        let storage = self.storage.as_ref()?;
        if self.refresh {
            tracing::info!("Refresh requested, ignoring cached ticker table");
            return None;
        }

        match storage.load_ticker_table() {
            Ok(Some(table)) if !table.is_empty() => {
                tracing::info!("Loaded {} tickers from local cache", table.len());
                Some(table)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable ticker cache: {}", e);
                None
            }
        }
    }

    async fn fetch_table(&self) -> Result<TickerTable, EdgarError> {
        tracing::info!("Fetching company tickers from SEC");
        let body = self.fetcher.fetch_text(COMPANY_TICKERS_URL).await?;
        let table = TickerTable::parse(&body, COMPANY_TICKERS_URL)?;
        tracing::info!("Fetched {} tickers", table.len());

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save_ticker_table(&table) {
                tracing::warn!("Failed to cache ticker table: {}", e);
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::testing::{StubFetcher, TICKERS_JSON};
    use tokio_test::block_on;

    fn stub() -> StubFetcher {
        StubFetcher::new().with(COMPANY_TICKERS_URL, TICKERS_JSON)
    }

    #[test]
    fn table_skips_malformed_rows_and_keeps_first_duplicate() {
        let table = TickerTable::parse(TICKERS_JSON, COMPANY_TICKERS_URL).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.lookup("BAD").is_none());
        assert!(table.lookup("NOCIK").is_none());
        assert_eq!(table.lookup("amd").unwrap().cik, 2488);
        assert_eq!(table.lookup("NEE").unwrap().cik, 753308, "string identifiers are accepted");
    }

    #[test]
    fn table_rejects_non_object_body() {
        let err = TickerTable::parse("[1, 2, 3]", COMPANY_TICKERS_URL).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn resolve_normalizes_and_pads() {
        let mut resolver = IdentifierResolver::new(stub()).unwrap();
        let identity = block_on(resolver.resolve("  aapl ")).unwrap();
        assert_eq!(identity.ticker(), "AAPL");
        assert_eq!(identity.cik(), "0000320193");
        assert_eq!(identity.name(), "Apple Inc.");
    }

    #[test]
    fn unknown_ticker_is_not_found() {
        let mut resolver = IdentifierResolver::new(stub()).unwrap();
        for ticker in ["ZZZZ", "BAD", ""] {
            let err = block_on(resolver.resolve(ticker)).unwrap_err();
            assert!(err.is_not_found(), "{ticker:?} should be NotFound, got {err:?}");
        }
    }

    #[test]
    fn table_is_fetched_once_and_identities_are_shared() {
        let fetcher = stub();
        let mut resolver = IdentifierResolver::new(fetcher.clone()).unwrap();

        let first = block_on(resolver.resolve("AMD")).unwrap();
        let _ = block_on(resolver.resolve("MISSING"));
        let again = block_on(resolver.resolve("amd")).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(fetcher.hits(COMPANY_TICKERS_URL), 1);
        assert!(resolver.table_loaded());
    }

    #[test]
    fn refresh_table_refetches() {
        let fetcher = stub();
        let mut resolver = IdentifierResolver::new(fetcher.clone()).unwrap();
        block_on(resolver.resolve("AMD")).unwrap();
        assert_eq!(block_on(resolver.refresh_table()).unwrap(), 3);
        assert_eq!(fetcher.hits(COMPANY_TICKERS_URL), 2);
    }

    #[test]
    fn missing_contact_fails_before_any_fetch() {
        let fetcher = stub().with_user_agent("  ");
        let err = IdentifierResolver::new(fetcher.clone()).unwrap_err();
        assert!(matches!(err, EdgarError::MissingPrecondition(_)));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[test]
    fn fetch_failure_surfaces_as_fetch_failed() {
        let mut resolver = IdentifierResolver::new(StubFetcher::new()).unwrap();
        let err = block_on(resolver.resolve("AMD")).unwrap_err();
        assert!(matches!(err, EdgarError::FetchFailed(FetchError::Http { .. })));
        assert!(!resolver.table_loaded());
    }

    #[test]
    fn disk_cache_is_written_then_reused() {
        let dir = std::env::temp_dir().join(format!("sec_catalog_resolver_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let storage = StorageManager::new(&dir).unwrap();

        let fetcher = stub();
        let mut resolver = IdentifierResolver::new(fetcher.clone())
            .unwrap()
            .with_storage(storage.clone(), false);
        block_on(resolver.resolve("AMD")).unwrap();
        assert_eq!(fetcher.hits(COMPANY_TICKERS_URL), 1);

        // A new session with an empty fetcher still resolves from disk.
        let offline = StubFetcher::new();
        let mut resolver = IdentifierResolver::new(offline.clone())
            .unwrap()
            .with_storage(storage.clone(), false);
        let identity = block_on(resolver.resolve("NEE")).unwrap();
        assert_eq!(identity.cik(), "0000753308");
        assert_eq!(offline.request_count(), 0);

        // Refresh bypasses the cached copy.
        let mut resolver = IdentifierResolver::new(offline.clone())
            .unwrap()
            .with_storage(storage, true);
        assert!(block_on(resolver.resolve("NEE")).is_err());
        assert_eq!(offline.request_count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
