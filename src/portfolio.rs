//! Multi-ticker overview.
//!
//! One failed symbol never sinks the batch: it is recorded as a warning and
//! left out of the table. Only an empty result is an error.

use log::{info, warn};

use crate::error::{FetchError, PortfolioError};
use crate::provider::DataProvider;
use crate::quote::{fmt_decimal, fmt_percent, fmt_text, Quote};

/// Column headers, in row order.
pub const COLUMNS: [&str; 8] = [
    "Ticker",
    "Name",
    "Current Price",
    "Sector",
    "Industry",
    "Country",
    "P/E (TTM)",
    "Dividend Yield",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRow {
    pub ticker: String,
    pub name: String,
    pub current_price: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub pe_ratio: String,
    pub dividend_yield: String,
}

impl PortfolioRow {
    pub fn from_quote(quote: &Quote) -> Self {
        PortfolioRow {
            ticker: quote.symbol.clone(),
            name: fmt_text(&quote.long_name),
            current_price: fmt_decimal(quote.current_price),
            sector: fmt_text(&quote.sector),
            industry: fmt_text(&quote.industry),
            country: fmt_text(&quote.country),
            pe_ratio: fmt_decimal(quote.trailing_pe),
            dividend_yield: fmt_percent(quote.dividend_yield.map(|y| y * 100.0)),
        }
    }

    pub fn cells(&self) -> [&str; 8] {
        [
            self.ticker.as_str(),
            self.name.as_str(),
            self.current_price.as_str(),
            self.sector.as_str(),
            self.industry.as_str(),
            self.country.as_str(),
            self.pe_ratio.as_str(),
            self.dividend_yield.as_str(),
        ]
    }
}

#[derive(Debug, Default)]
pub struct PortfolioReport {
    pub rows: Vec<PortfolioRow>,
    pub warnings: Vec<FetchError>,
}

/// Split a comma list into uppercase tickers, dropping blanks.
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Fetch every ticker in order, keeping the ones that succeed.
pub fn aggregate(provider: &dyn DataProvider, tickers: &[String]) -> Result<PortfolioReport, PortfolioError> {
    if tickers.is_empty() {
        return Err(PortfolioError::NoValidTickers);
    }

    let mut report = PortfolioReport::default();
    for ticker in tickers {
        match provider.info(ticker) {
            Ok(info) => {
                let quote = Quote::from_info(ticker, &info);
                report.rows.push(PortfolioRow::from_quote(&quote));
            }
            Err(e) => {
                warn!("skipping {}: {}", ticker, e.cause);
                report.warnings.push(e);
            }
        }
    }

    if report.rows.is_empty() {
        return Err(PortfolioError::AllFailed(report.warnings));
    }
    info!(
        "portfolio: {} rows, {} skipped",
        report.rows.len(),
        report.warnings.len()
    );
    Ok(report)
}
