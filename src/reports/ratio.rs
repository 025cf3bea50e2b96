// src/reports/ratio.rs
use std::fmt;
use std::str::FromStr;

use crate::reports::statement::LineItemSource;
use crate::utils::error::RatioError;

/// What to do when a ratio cannot be computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the `RatioError`.
    #[default]
    Abort,
    /// Log a warning and return `Ok(None)`.
    Skip,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(format!("unknown failure policy {:?} (expected abort or skip)", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Skip => f.write_str("skip"),
        }
    }
}

/// Candidate labels for each line item, tried in order.
#[derive(Debug, Clone)]
pub struct RatioLabels {
    pub net_income: Vec<String>,
    pub equity: Vec<String>,
    pub total_assets: Vec<String>,
}

impl Default for RatioLabels {
    fn default() -> Self {
        Self {
            net_income: owned(&[
                "Net income",
                "Net income (loss)",
                "Net loss",
                "Net earnings",
                "Net income attributable to common stockholders",
            ]),
            equity: owned(&[
                "Total stockholders' equity",
                "Total shareholders' equity",
                "Total stockholders' equity (deficit)",
                "Total equity",
            ]),
            total_assets: owned(&["Total assets"]),
        }
    }
}

impl RatioLabels {
    /// us-gaap tag names, for ratios over XBRL company facts.
    pub fn us_gaap() -> Self {
        Self {
            net_income: owned(&[
                "NetIncomeLoss",
                "ProfitLoss",
                "NetIncomeLossAvailableToCommonStockholdersBasic",
            ]),
            equity: owned(&[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ]),
            total_assets: owned(&["Assets"]),
        }
    }
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

/// Computes profitability ratios from line items looked up by label and
/// period. Results are fractions (0.05 = 5%) rounded to five decimals.
#[derive(Debug, Clone, Default)]
pub struct RatioCalculator {
    policy: FailurePolicy,
    labels: RatioLabels,
}

impl RatioCalculator {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            labels: RatioLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: RatioLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Net income / stockholders' equity.
    pub fn return_on_equity<S: LineItemSource>(
        &self,
        source: &S,
        period: &str,
    ) -> Result<Option<f64>, RatioError> {
        let result = self.lookup(source, &self.labels.net_income, period).and_then(|net_income| {
            let equity = self.lookup(source, &self.labels.equity, period)?;
            divide(net_income, equity, "stockholders' equity", period)
        });
        self.apply_policy("ROE", period, result)
    }

    /// Net income / total assets at the end of `period`.
    pub fn return_on_assets<S: LineItemSource>(
        &self,
        source: &S,
        period: &str,
    ) -> Result<Option<f64>, RatioError> {
        let result = self.lookup(source, &self.labels.net_income, period).and_then(|net_income| {
            let assets = self.lookup(source, &self.labels.total_assets, period)?;
            divide(net_income, assets, "total assets", period)
        });
        self.apply_policy("ROA", period, result)
    }

    /// Net income / mean of total assets at `period` and `previous`.
    pub fn return_on_average_assets<S: LineItemSource>(
        &self,
        source: &S,
        period: &str,
        previous: &str,
    ) -> Result<Option<f64>, RatioError> {
        let result = self.lookup(source, &self.labels.net_income, period).and_then(|net_income| {
            let current = self.lookup(source, &self.labels.total_assets, period)?;
            let prior = self.lookup(source, &self.labels.total_assets, previous)?;
            divide(net_income, (current + prior) / 2.0, "average total assets", period)
        });
        self.apply_policy("ROA (average assets)", period, result)
    }

    fn lookup<S: LineItemSource>(
        &self,
        source: &S,
        labels: &[String],
        period: &str,
    ) -> Result<f64, RatioError> {
        labels
            .iter()
            .find_map(|label| source.value(label, period))
            .ok_or_else(|| RatioError::MissingValue {
                labels: labels.to_vec(),
                period: period.to_string(),
            })
    }

    fn apply_policy(
        &self,
        ratio: &str,
        period: &str,
        result: Result<f64, RatioError>,
    ) -> Result<Option<f64>, RatioError> {
        match (result, self.policy) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(e), FailurePolicy::Abort) => Err(e),
            (Err(e), FailurePolicy::Skip) => {
                tracing::warn!("{} could not be calculated for {}: {}", ratio, period, e);
                Ok(None)
            }
        }
    }
}

fn divide(numerator: f64, denominator: f64, label: &str, period: &str) -> Result<f64, RatioError> {
    if denominator == 0.0 {
        return Err(RatioError::ZeroDenominator {
            label: label.to_string(),
            period: period.to_string(),
        });
    }
    Ok(round5(numerator / denominator))
}

fn round5(value: f64) -> f64 {
    (value * 100_000.0).round() / 100_000.0
}
