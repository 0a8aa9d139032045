//! Market data lookups.
//!
//! The dashboard only needs two things from a data source: a sparse
//! snapshot of quote and fundamentals fields for a symbol, and its OHLC
//! history for a period. [`yahoo::YahooClient`] is the production source.

pub mod yahoo;

#[cfg(test)]
pub mod mock;

use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::history::HistoryBar;
use crate::period::HistoryQuery;

/// Sparse key/value snapshot; any key may be absent.
pub type InfoMap = Map<String, Value>;

pub trait DataProvider: Send + Sync {
    fn info(&self, symbol: &str) -> Result<InfoMap, FetchError>;

    /// Chronological bars, possibly empty.
    fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<Vec<HistoryBar>, FetchError>;
}
