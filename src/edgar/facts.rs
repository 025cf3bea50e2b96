// src/edgar/facts.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::edgar::cache::Cached;
use crate::edgar::client::{companyfacts_url, fetch_json, Fetch};
use crate::edgar::models::CompanyIdentity;
use crate::reports::statement::LineItemSource;
use crate::utils::config::require_contact;
use crate::utils::error::EdgarError;

pub const US_GAAP: &str = "us-gaap";

/// Units tried in order when reading a monetary fact.
const UNIT_PREFERENCE: [&str; 3] = ["USD", "shares", "pure"];

/// Structure of the XBRL company facts document.
/// Example: https://data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    #[serde(default)]
    pub entity_name: String,
    /// Taxonomy ("us-gaap", "dei", ...) -> tag -> facts.
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, TagFacts>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagFacts {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit ("USD", "shares", ...) -> reported values.
    #[serde(default)]
    pub units: HashMap<String, Vec<FactValue>>,
}

/// A single reported value with its filing context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactValue {
    /// Period end, `YYYY-MM-DD`.
    pub end: String,
    pub val: f64,
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year of the filing that reported the value.
    #[serde(default)]
    pub fy: Option<i32>,
    /// "FY", "Q1", ...
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub filed: Option<String>,
    #[serde(default)]
    pub frame: Option<String>,
}

impl CompanyFacts {
    pub fn us_gaap(&self) -> Option<&HashMap<String, TagFacts>> {
        self.facts.get(US_GAAP)
    }

    /// Looks up a us-gaap tag, case-insensitively ("netincomeloss" finds
    /// "NetIncomeLoss").
    pub fn tag(&self, tag: &str) -> Option<&TagFacts> {
        let taxonomy = self.us_gaap()?;
        taxonomy.get(tag).or_else(|| {
            taxonomy
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(tag))
                .map(|(_, facts)| facts)
        })
    }

    /// Annual value of `tag` for fiscal year `fiscal_year`.
    ///
    /// A 10-K also restates prior years under the same `fy`, so among the
    /// full-year values reported for that year the latest period end wins.
    pub fn annual_value(&self, tag: &str, fiscal_year: i32) -> Option<f64> {
        let tag_facts = self.tag(tag)?;

        UNIT_PREFERENCE.iter().find_map(|unit| {
            tag_facts
                .units
                .get(*unit)?
                .iter()
                .filter(|v| v.fy == Some(fiscal_year) && v.fp.as_deref() == Some("FY"))
                .filter(|v| v.form.as_deref().map_or(true, |f| f.starts_with("10-K")))
                .max_by(|a, b| a.end.cmp(&b.end))
                .map(|v| v.val)
        })
    }
}

/// Labels are us-gaap tag names; periods are fiscal years ("2023").
impl LineItemSource for CompanyFacts {
    fn value(&self, label: &str, period: &str) -> Option<f64> {
        let fiscal_year = period.trim().parse().ok()?;
        self.annual_value(label.trim(), fiscal_year)
    }
}

/// Fetches and caches company facts, one slot per identity.
#[derive(Debug)]
pub struct FactsStore<F> {
    fetcher: F,
    cache: HashMap<CompanyIdentity, Cached<Arc<CompanyFacts>>>,
}

impl<F: Fetch> FactsStore<F> {
    pub fn new(fetcher: F) -> Result<Self, EdgarError> {
        require_contact(fetcher.user_agent())?;
        Ok(Self {
            fetcher,
            cache: HashMap::new(),
        })
    }

    /// Returns the facts for `identity`, fetching them on first use.
    pub async fn facts(
        &mut self,
        identity: &Arc<CompanyIdentity>,
    ) -> Result<Arc<CompanyFacts>, EdgarError> {
        if let Some(facts) = self.cache.get(&**identity).and_then(Cached::get) {
            return Ok(Arc::clone(facts));
        }

        let url = companyfacts_url(identity.cik());
        tracing::info!("Fetching company facts for {} (CIK {})", identity.ticker(), identity.cik());
        let facts: CompanyFacts = fetch_json(&self.fetcher, &url).await?;

        if facts.us_gaap().is_none() {
            tracing::warn!("No us-gaap facts reported for {}", identity.ticker());
        }

        let facts = Arc::new(facts);
        self.cache
            .entry(CompanyIdentity::clone(identity))
            .or_default()
            .store(Arc::clone(&facts));
        Ok(facts)
    }

    pub fn invalidate(&mut self, identity: &CompanyIdentity) {
        if let Some(slot) = self.cache.get_mut(identity) {
            slot.reset();
        }
    }

    pub fn is_cached(&self, identity: &CompanyIdentity) -> bool {
        self.cache.get(identity).is_some_and(Cached::is_fetched)
    }
}
