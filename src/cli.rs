use std::path::PathBuf;

use clap::Parser;

use crate::history::ChartKind;
use crate::period::Period;

/// Terminal dashboard for stock quotes, fundamentals and price history.
#[derive(Debug, Clone, Parser)]
#[command(name = "stock-dash", version, about)]
pub struct Args {
    /// Ticker shown on startup
    #[arg(short, long, default_value = "AAPL")]
    pub ticker: String,

    /// Chart period on startup
    #[arg(short, long, value_enum, default_value_t = Period::FiveDays)]
    pub period: Period,

    /// Chart style
    #[arg(short, long, value_enum, default_value_t = ChartKind::Line)]
    pub chart: ChartKind,

    /// Comma-separated tickers to load into the portfolio tab on startup
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Provider request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Log file (defaults to the user cache directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
