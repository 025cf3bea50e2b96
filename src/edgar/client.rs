// src/edgar/client.rs
use std::future::Future;
use std::time::Duration;

use reqwest::header;
use serde::de::DeserializeOwned;

use crate::utils::config::EdgarConfig;
use crate::utils::error::{EdgarError, FetchError};

pub const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
pub const SUBMISSIONS_BASE_URL: &str = "https://data.sec.gov/submissions";
pub const ARCHIVES_BASE_URL: &str = "https://www.sec.gov/Archives/edgar/data";
pub const COMPANY_FACTS_BASE_URL: &str = "https://data.sec.gov/api/xbrl/companyfacts";

/// Submissions feed for a zero-padded identifier.
pub fn submissions_url(cik: &str) -> String {
    format!("{}/CIK{}.json", SUBMISSIONS_BASE_URL, cik)
}

/// XBRL company facts for a zero-padded identifier.
pub fn companyfacts_url(cik: &str) -> String {
    format!("{}/CIK{}.json", COMPANY_FACTS_BASE_URL, cik)
}

/// An archived submissions page named in `filings.files`.
pub fn submissions_page_url(name: &str) -> String {
    format!("{}/{}", SUBMISSIONS_BASE_URL, name)
}

/// Directory of a single filing in the EDGAR archive.
pub fn filing_base_url(cik: &str, accession_compact: &str) -> String {
    // Archive paths use the identifier without its zero padding.
    let cik = cik.trim_start_matches('0');
    format!("{}/{}/{}", ARCHIVES_BASE_URL, cik, accession_compact)
}

/// Something that can GET a URL as text.
///
/// `EdgarClient` is the real implementation; tests substitute an in-memory
/// one. The contact string is exposed so callers can check the precondition
/// before issuing a request.
pub trait Fetch {
    fn user_agent(&self) -> &str;

    fn fetch_text(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Fetches `url` and deserializes it as JSON. Bodies that do not match `T`
/// are reported as `FetchError::Malformed`.
pub async fn fetch_json<F, T>(fetcher: &F, url: &str) -> Result<T, FetchError>
where
    F: Fetch,
    T: DeserializeOwned,
{
    let body = fetcher.fetch_text(url).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// reqwest client configured for EDGAR interaction.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    user_agent: String,
    request_delay: Duration,
}

impl EdgarClient {
    /// Builds the client. Fails with `MissingPrecondition` when no contact
    /// string is configured, before any request can be made.
    pub fn new(config: &EdgarConfig) -> Result<Self, EdgarError> {
        let user_agent = config.require_user_agent()?.to_string();

        let http = reqwest::Client::builder()
            .user_agent(user_agent.as_str()) // Set the required User-Agent
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::from)?;

        tracing::debug!(
            "Built EDGAR client (timeout {:?}, delay {:?})",
            config.timeout,
            config.request_delay
        );

        Ok(Self {
            http,
            user_agent,
            request_delay: config.request_delay,
        })
    }
}

impl Fetch for EdgarClient {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);

        // Fixed spacing between requests per SEC fair-access policy.
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json,application/xml,text/html,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(FetchError::RateLimited { url: url.to_string() });
            }
            return Err(FetchError::Http {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

        Ok(body)
    }
}
