use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{DataProvider, InfoMap};
use crate::error::{FetchCause, FetchError};
use crate::history::HistoryBar;
use crate::period::HistoryQuery;

/// In-memory provider for tests.
#[derive(Default)]
pub struct MockProvider {
    info: HashMap<String, InfoMap>,
    history: HashMap<String, Vec<HistoryBar>>,
    failures: HashSet<String>,
    queries: Mutex<Vec<(String, HistoryQuery)>>,
}

impl MockProvider {
    pub fn with_info(mut self, symbol: &str, info: InfoMap) -> Self {
        self.info.insert(symbol.to_string(), info);
        self
    }

    pub fn with_history(mut self, symbol: &str, bars: Vec<HistoryBar>) -> Self {
        self.history.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failures.insert(symbol.to_string());
        self
    }

    pub fn last_query(&self) -> Option<HistoryQuery> {
        self.queries.lock().ok()?.last().map(|(_, q)| *q)
    }

    pub fn history_calls(&self, symbol: &str) -> usize {
        self.queries
            .lock()
            .map(|q| q.iter().filter(|(s, _)| s == symbol).count())
            .unwrap_or(0)
    }
}

impl DataProvider for MockProvider {
    fn info(&self, symbol: &str) -> Result<InfoMap, FetchError> {
        if self.failures.contains(symbol) {
            return Err(FetchError::new(
                symbol,
                FetchCause::Provider(format!("Quote not found for symbol: {}", symbol)),
            ));
        }
        self.info
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::new(symbol, FetchCause::NotFound))
    }

    fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<Vec<HistoryBar>, FetchError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((symbol.to_string(), *query));
        }
        if self.failures.contains(symbol) {
            return Err(FetchError::new(symbol, FetchCause::NotFound));
        }
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }
}
