use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::debug;

use crate::error::FetchError;
use crate::period::{resolve, HistoryQuery, Period};
use crate::provider::DataProvider;

/// One OHLC sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// An empty series is a normal answer, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Bars(Vec<HistoryBar>),
    NoData,
}

impl HistoryOutcome {
    pub fn from_bars(bars: Vec<HistoryBar>) -> Self {
        if bars.is_empty() {
            HistoryOutcome::NoData
        } else {
            HistoryOutcome::Bars(bars)
        }
    }

    pub fn bars(&self) -> &[HistoryBar] {
        match self {
            HistoryOutcome::Bars(bars) => bars,
            HistoryOutcome::NoData => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChartKind {
    /// Closing price line
    #[default]
    Line,
    /// Open/high/low/close candles
    Candlestick,
}

impl ChartKind {
    pub fn toggle(self) -> ChartKind {
        match self {
            ChartKind::Line => ChartKind::Candlestick,
            ChartKind::Candlestick => ChartKind::Line,
        }
    }
}

/// High, low and net move over a fetched series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSummary {
    pub high: f64,
    pub low: f64,
    pub change: f64,
    pub change_percent: Option<f64>,
}

pub fn summarize(bars: &[HistoryBar]) -> Option<RangeSummary> {
    let first = bars.first()?;
    let last = bars.last()?;
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let change = last.close - first.open;
    let change_percent = if first.open != 0.0 {
        Some(change / first.open * 100.0)
    } else {
        None
    };
    Some(RangeSummary {
        high,
        low,
        change,
        change_percent,
    })
}

/// Fetch the bars charted for `period`.
pub fn fetch_history(
    provider: &dyn DataProvider,
    symbol: &str,
    period: Period,
) -> Result<(HistoryQuery, HistoryOutcome), FetchError> {
    let query = resolve(period);
    let bars = provider.history(symbol, &query)?;
    debug!("{} bars for {} ({} @ {})", bars.len(), symbol, query.period, query.interval);
    Ok((query, HistoryOutcome::from_bars(bars)))
}

#[cfg(test)]
pub(crate) fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64) -> HistoryBar {
    HistoryBar {
        timestamp: DateTime::from_timestamp(ts, 0).unwrap(),
        open,
        high,
        low,
        close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Interval;
    use crate::provider::mock::MockProvider;

    #[test]
    fn empty_series_is_no_data() {
        assert_eq!(HistoryOutcome::from_bars(Vec::new()), HistoryOutcome::NoData);
        assert!(HistoryOutcome::NoData.bars().is_empty());
    }

    #[test]
    fn fetch_history_signals_no_data_for_empty_series() {
        let provider = MockProvider::default().with_info("AAPL", serde_json::Map::new());
        let (query, outcome) = fetch_history(&provider, "AAPL", Period::OneDay).unwrap();
        assert_eq!(query.interval, Interval::TwoMinutes);
        assert_eq!(outcome, HistoryOutcome::NoData);
    }

    #[test]
    fn fetch_history_passes_resolved_query() {
        let provider = MockProvider::default().with_history("MSFT", vec![bar(1_700_000_000, 1.0, 2.0, 0.5, 1.5)]);
        let (query, outcome) = fetch_history(&provider, "MSFT", Period::FiveDays).unwrap();
        assert_eq!(query.interval, Interval::FifteenMinutes);
        assert_eq!(outcome.bars().len(), 1);
        assert_eq!(provider.last_query().map(|q| q.interval), Some(Interval::FifteenMinutes));
    }

    #[test]
    fn fetch_history_propagates_failure() {
        let provider = MockProvider::default().with_failure("BAD");
        let err = fetch_history(&provider, "BAD", Period::OneMonth).unwrap_err();
        assert_eq!(err.symbol, "BAD");
    }

    #[test]
    fn summary_spans_whole_series() {
        let bars = vec![
            bar(1, 100.0, 104.0, 99.0, 103.0),
            bar(2, 103.0, 110.0, 101.0, 108.0),
            bar(3, 108.0, 109.0, 95.0, 110.0),
        ];
        let s = summarize(&bars).unwrap();
        assert_eq!(s.high, 110.0);
        assert_eq!(s.low, 95.0);
        assert_eq!(s.change, 10.0);
        assert_eq!(s.change_percent, Some(10.0));
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn chart_kind_toggles() {
        assert_eq!(ChartKind::default().toggle(), ChartKind::Candlestick);
        assert_eq!(ChartKind::Candlestick.toggle(), ChartKind::Line);
    }
}
