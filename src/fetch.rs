use log::{info, warn};

use crate::error::FetchError;
use crate::history::{fetch_history, HistoryOutcome};
use crate::period::{HistoryQuery, Period};
use crate::provider::DataProvider;
use crate::quote::{DisplayQuote, Quote};

/// Everything the quote view shows for one ticker.
#[derive(Debug, Clone)]
pub struct QuoteReport {
    pub quote: DisplayQuote,
    pub query: HistoryQuery,
    pub history: HistoryOutcome,
}

/// Snapshot, today's bar and the charted history for one ticker.
///
/// A missing daily bar only costs the price override; a failed snapshot
/// or history lookup fails the whole report.
pub fn fetch_quote(provider: &dyn DataProvider, symbol: &str, period: Period) -> Result<QuoteReport, FetchError> {
    let info = provider.info(symbol)?;
    let quote = Quote::from_info(symbol, &info);

    let latest = match provider.history(symbol, &HistoryQuery::latest_daily()) {
        Ok(bars) => bars.last().cloned(),
        Err(e) => {
            warn!("no daily bar for {}: {}", symbol, e.cause);
            None
        }
    };

    let (query, history) = fetch_history(provider, symbol, period)?;
    info!(
        "fetched {} ({} bars for {})",
        symbol,
        history.bars().len(),
        query.period
    );

    Ok(QuoteReport {
        quote: quote.display(latest.as_ref()),
        query,
        history,
    })
}
