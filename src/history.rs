//! Price history abstractions and core types

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Chronological daily bars for one symbol over the trailing year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Outcome of a history fetch. Retrieval failures of any kind (unknown
/// symbol, network error, provider error, empty payload) surface as
/// `NoData`; callers render it as "no data available", never as a crash.
/// The reason is for the message and the logs only.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Series(PriceSeries),
    NoData { reason: String },
}

impl HistoryOutcome {
    pub fn series(&self) -> Option<&PriceSeries> {
        match self {
            HistoryOutcome::Series(series) => Some(series),
            HistoryOutcome::NoData { .. } => None,
        }
    }
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetches one year of daily history for `symbol`. Total: every failure
    /// maps to `HistoryOutcome::NoData`.
    async fn fetch_history(&self, symbol: &str) -> HistoryOutcome;
}
