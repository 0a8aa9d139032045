//! Quote decoding and display formatting.
//!
//! [`Quote`] is the typed view of a provider snapshot where every field is
//! optional. [`DisplayQuote`] is what the screen shows: every field is a
//! ready string, either a formatted value or [`NOT_AVAILABLE`].

use serde_json::Value;

use crate::history::HistoryBar;
use crate::provider::InfoMap;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    /// Fraction, e.g. 0.0044 for 0.44%.
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub price_to_book: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

fn number(info: &InfoMap, key: &str) -> Option<f64> {
    match info.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text(info: &InfoMap, key: &str) -> Option<String> {
    info.get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Quote {
    /// Decode a sparse snapshot. Missing or mistyped keys become `None`.
    pub fn from_info(symbol: &str, info: &InfoMap) -> Self {
        Quote {
            symbol: symbol.to_string(),
            long_name: text(info, "longName").or_else(|| text(info, "shortName")),
            sector: text(info, "sector"),
            industry: text(info, "industry"),
            country: text(info, "country"),
            website: text(info, "website"),
            current_price: number(info, "currentPrice").or_else(|| number(info, "regularMarketPrice")),
            previous_close: number(info, "previousClose")
                .or_else(|| number(info, "regularMarketPreviousClose")),
            market_cap: number(info, "marketCap"),
            trailing_pe: number(info, "trailingPE"),
            dividend_yield: number(info, "dividendYield"),
            beta: number(info, "beta"),
            trailing_eps: number(info, "trailingEps"),
            price_to_book: number(info, "priceToBook"),
            fifty_two_week_high: number(info, "fiftyTwoWeekHigh"),
            fifty_two_week_low: number(info, "fiftyTwoWeekLow"),
        }
    }

    /// Latest close when a bar is at hand, else the snapshot price.
    pub fn effective_price(&self, latest: Option<&HistoryBar>) -> Option<f64> {
        latest.map(|bar| bar.close).or(self.current_price)
    }

    /// `(change, change_percent)`, defined only against a nonzero previous close.
    pub fn change(&self, latest: Option<&HistoryBar>) -> Option<(f64, f64)> {
        let price = self.effective_price(latest)?;
        let prev = self.previous_close.filter(|p| *p != 0.0)?;
        let change = price - prev;
        Some((change, change / prev * 100.0))
    }

    pub fn display(&self, latest: Option<&HistoryBar>) -> DisplayQuote {
        DisplayQuote {
            symbol: self.symbol.clone(),
            company_name: fmt_text(&self.long_name),
            sector: fmt_text(&self.sector),
            industry: fmt_text(&self.industry),
            country: fmt_text(&self.country),
            website: fmt_text(&self.website),
            current_price: fmt_decimal(self.effective_price(latest)),
            previous_close: fmt_decimal(self.previous_close),
            change: fmt_change(self.change(latest)),
            market_cap: fmt_thousands(self.market_cap),
            pe_ratio: fmt_decimal(self.trailing_pe),
            dividend_yield: fmt_percent(self.dividend_yield.map(|y| y * 100.0)),
            beta: fmt_decimal(self.beta),
            eps: fmt_decimal(self.trailing_eps),
            price_to_book: fmt_decimal(self.price_to_book),
            fifty_two_week_high: fmt_decimal(self.fifty_two_week_high),
            fifty_two_week_low: fmt_decimal(self.fifty_two_week_low),
            direction: self.change(latest).map(|(c, _)| c),
        }
    }
}

/// Formatted snapshot ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayQuote {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub website: String,
    pub current_price: String,
    pub previous_close: String,
    pub change: String,
    pub market_cap: String,
    pub pe_ratio: String,
    pub dividend_yield: String,
    pub beta: String,
    pub eps: String,
    pub price_to_book: String,
    pub fifty_two_week_high: String,
    pub fifty_two_week_low: String,
    /// Raw change, kept for colouring.
    pub direction: Option<f64>,
}

impl DisplayQuote {
    /// Label/value pairs in display order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Company Name", self.company_name.as_str()),
            ("Sector", self.sector.as_str()),
            ("Industry", self.industry.as_str()),
            ("Country", self.country.as_str()),
            ("Website", self.website.as_str()),
            ("Current Price", self.current_price.as_str()),
            ("Previous Close", self.previous_close.as_str()),
            ("Change", self.change.as_str()),
            ("Market Cap", self.market_cap.as_str()),
            ("PE Ratio", self.pe_ratio.as_str()),
            ("Dividend Yield", self.dividend_yield.as_str()),
            ("Beta", self.beta.as_str()),
            ("EPS", self.eps.as_str()),
            ("Price/Book Ratio", self.price_to_book.as_str()),
            ("52 Week High", self.fifty_two_week_high.as_str()),
            ("52 Week Low", self.fifty_two_week_low.as_str()),
        ]
    }

    /// Name for headings, falling back to the ticker.
    pub fn title(&self) -> &str {
        if self.company_name == NOT_AVAILABLE {
            &self.symbol
        } else {
            &self.company_name
        }
    }
}

pub fn fmt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn fmt_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn fmt_change(change: Option<(f64, f64)>) -> String {
    match change {
        Some((change, percent)) => format!("{:.2} ({:.2}%)", change, percent),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Rounded integer with `,` between thousands groups.
pub fn fmt_thousands(value: Option<f64>) -> String {
    let Some(v) = value else {
        return NOT_AVAILABLE.to_string();
    };
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
