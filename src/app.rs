use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use log::{debug, error, warn};

use crate::cli::Args;
use crate::error::{FetchError, PortfolioError};
use crate::fetch::{fetch_quote, QuoteReport};
use crate::history::{ChartKind, HistoryOutcome};
use crate::period::Period;
use crate::portfolio::{aggregate, parse_tickers, PortfolioReport};
use crate::provider::DataProvider;

const FAILURE_HINT: &str =
    "Possible causes: invalid ticker symbol, no internet connection, API rate limit exceeded (try again later).";

/// Message sent from a fetch thread back to the UI loop
#[derive(Debug)]
enum FetchMessage {
    Quote {
        request: u64,
        result: Result<QuoteReport, FetchError>,
    },
    Portfolio {
        request: u64,
        result: Result<PortfolioReport, PortfolioError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Quote,
    Portfolio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditTicker(String),
    EditPortfolio(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    FetchQuote,
    FetchPortfolio,
}

pub struct App {
    pub tab: Tab,
    pub input_mode: InputMode,
    pub ticker: String,
    pub period: Period,
    pub chart_kind: ChartKind,
    pub portfolio_input: String,
    pub quote: Option<QuoteReport>,
    pub portfolio: Option<PortfolioReport>,
    pub status: Option<StatusMessage>,
    pub last_update: Option<DateTime<Local>>,
    provider: Arc<dyn DataProvider>,
    request_counter: u64,
    // Only the newest request of each kind is applied; anything else is stale.
    pending_quote: Option<u64>,
    pending_portfolio: Option<u64>,
    fetch_sender: Sender<FetchMessage>,
    fetch_receiver: Receiver<FetchMessage>,
}

impl App {
    pub fn new(args: &Args, provider: Arc<dyn DataProvider>) -> Self {
        let (fetch_sender, fetch_receiver) = mpsc::channel();
        App {
            tab: Tab::Quote,
            input_mode: InputMode::Normal,
            ticker: args.ticker.trim().to_uppercase(),
            period: args.period,
            chart_kind: args.chart,
            portfolio_input: args.portfolio.clone().unwrap_or_default(),
            quote: None,
            portfolio: None,
            status: None,
            last_update: None,
            provider,
            request_counter: 0,
            pending_quote: None,
            pending_portfolio: None,
            fetch_sender,
            fetch_receiver,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_quote.is_some() || self.pending_portfolio.is_some()
    }

    fn set_status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            severity,
            text: text.into(),
        });
    }

    fn next_request(&mut self) -> u64 {
        self.request_counter += 1;
        self.request_counter
    }

    /// Fetch the current ticker in the background.
    pub fn start_quote_fetch(&mut self) {
        let symbol = self.ticker.trim().to_uppercase();
        if symbol.is_empty() {
            self.set_status(Severity::Warning, "Please enter a stock ticker symbol.");
            return;
        }
        self.ticker = symbol.clone();

        let request = self.next_request();
        self.pending_quote = Some(request);
        let period = self.period;
        self.set_status(Severity::Info, format!("Fetching {} ({})...", symbol, period));

        let provider = Arc::clone(&self.provider);
        let sender = self.fetch_sender.clone();
        thread::spawn(move || {
            let result = fetch_quote(provider.as_ref(), &symbol, period);
            let _ = sender.send(FetchMessage::Quote { request, result });
        });
    }

    /// Fetch every ticker of the portfolio list in the background.
    pub fn start_portfolio_fetch(&mut self) {
        let tickers = parse_tickers(&self.portfolio_input);
        if tickers.is_empty() {
            self.pending_portfolio = None;
            self.apply_portfolio(Err(PortfolioError::NoValidTickers));
            return;
        }
        self.portfolio_input = tickers.join(", ");

        let request = self.next_request();
        self.pending_portfolio = Some(request);
        self.set_status(Severity::Info, format!("Fetching {} tickers...", tickers.len()));

        let provider = Arc::clone(&self.provider);
        let sender = self.fetch_sender.clone();
        thread::spawn(move || {
            let result = aggregate(provider.as_ref(), &tickers);
            let _ = sender.send(FetchMessage::Portfolio { request, result });
        });
    }

    /// Apply finished fetches without blocking.
    /// Returns true if anything changed.
    pub fn process_fetch_results(&mut self) -> bool {
        let mut updated = false;

        while let Ok(msg) = self.fetch_receiver.try_recv() {
            match msg {
                FetchMessage::Quote { request, result } => {
                    if self.pending_quote != Some(request) {
                        debug!("dropping superseded quote fetch #{}", request);
                        continue;
                    }
                    self.pending_quote = None;
                    self.apply_quote(result);
                }
                FetchMessage::Portfolio { request, result } => {
                    if self.pending_portfolio != Some(request) {
                        debug!("dropping superseded portfolio fetch #{}", request);
                        continue;
                    }
                    self.pending_portfolio = None;
                    self.apply_portfolio(result);
                }
            }
            updated = true;
        }

        updated
    }

    fn apply_quote(&mut self, result: Result<QuoteReport, FetchError>) {
        match result {
            Ok(report) => {
                match report.history {
                    HistoryOutcome::NoData => self.set_status(
                        Severity::Info,
                        format!("No historical data for {} ({}).", report.quote.symbol, report.query.period),
                    ),
                    HistoryOutcome::Bars(_) => {
                        self.set_status(Severity::Info, format!("Updated {}", report.quote.symbol))
                    }
                }
                self.quote = Some(report);
                self.last_update = Some(Local::now());
            }
            // Previous data stays on screen.
            Err(e) => {
                error!("{}", e);
                self.set_status(Severity::Error, format!("{}. {}", e, FAILURE_HINT));
            }
        }
    }

    fn apply_portfolio(&mut self, result: Result<PortfolioReport, PortfolioError>) {
        match result {
            Ok(report) => {
                if report.warnings.is_empty() {
                    self.set_status(Severity::Info, format!("Loaded {} tickers", report.rows.len()));
                } else {
                    let skipped: Vec<&str> = report.warnings.iter().map(|w| w.symbol.as_str()).collect();
                    self.set_status(Severity::Warning, format!("Skipped {}", skipped.join(", ")));
                }
                self.portfolio = Some(report);
                self.last_update = Some(Local::now());
            }
            Err(e) => {
                let text = e.to_string();
                match e {
                    PortfolioError::AllFailed(warnings) => {
                        error!("{}", text);
                        self.set_status(Severity::Error, text);
                        self.portfolio = Some(PortfolioReport {
                            rows: Vec::new(),
                            warnings,
                        });
                    }
                    PortfolioError::NoValidTickers => {
                        warn!("{}", text);
                        self.portfolio = None;
                        self.set_status(Severity::Warning, text);
                    }
                }
            }
        }
    }

    fn begin_edit(&mut self) {
        self.input_mode = match self.tab {
            Tab::Quote => InputMode::EditTicker(self.ticker.clone()),
            Tab::Portfolio => InputMode::EditPortfolio(self.portfolio_input.clone()),
        };
    }

    fn refresh_action(&self) -> Action {
        match self.tab {
            Tab::Quote => Action::FetchQuote,
            Tab::Portfolio => Action::FetchPortfolio,
        }
    }

    pub fn handle_input(&mut self, key: KeyCode) -> Action {
        match &mut self.input_mode {
            InputMode::Normal => match key {
                KeyCode::Char('q') => Action::Quit,
                KeyCode::Tab | KeyCode::BackTab => {
                    self.tab = match self.tab {
                        Tab::Quote => Tab::Portfolio,
                        Tab::Portfolio => Tab::Quote,
                    };
                    Action::None
                }
                KeyCode::Char('/') | KeyCode::Char('i') => {
                    self.begin_edit();
                    Action::None
                }
                KeyCode::Char('r') | KeyCode::Enter => self.refresh_action(),
                KeyCode::Char('c') => {
                    self.chart_kind = self.chart_kind.toggle();
                    Action::None
                }
                // Period changes re-fetch straight away
                KeyCode::Char(']') | KeyCode::Right if self.tab == Tab::Quote => {
                    self.period = self.period.next();
                    Action::FetchQuote
                }
                KeyCode::Char('[') | KeyCode::Left if self.tab == Tab::Quote => {
                    self.period = self.period.prev();
                    Action::FetchQuote
                }
                _ => Action::None,
            },
            InputMode::EditTicker(buffer) => match key {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    Action::None
                }
                KeyCode::Enter => {
                    self.ticker = buffer.trim().to_uppercase();
                    self.input_mode = InputMode::Normal;
                    Action::FetchQuote
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    Action::None
                }
                KeyCode::Char(c) if !c.is_whitespace() && c != ',' => {
                    buffer.push(c.to_ascii_uppercase());
                    Action::None
                }
                _ => Action::None,
            },
            InputMode::EditPortfolio(buffer) => match key {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    Action::None
                }
                KeyCode::Enter => {
                    self.portfolio_input = buffer.clone();
                    self.input_mode = InputMode::Normal;
                    Action::FetchPortfolio
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    Action::None
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    Action::None
                }
                _ => Action::None,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::history::bar;
    use crate::provider::mock::MockProvider;
    use clap::Parser;
    use serde_json::json;
    use std::time::Duration;

    pub(crate) fn provider() -> MockProvider {
        MockProvider::default()
            .with_info(
                "AAPL",
                json!({ "longName": "Apple Inc.", "currentPrice": 150.0, "previousClose": 145.0 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .with_info(
                "MSFT",
                json!({ "longName": "Microsoft Corporation", "currentPrice": 410.0 })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .with_history(
                "MSFT",
                vec![
                    bar(1_700_000_000, 400.0, 405.0, 398.0, 404.0),
                    bar(1_700_086_400, 404.0, 412.0, 401.0, 410.0),
                ],
            )
            .with_failure("BADTICKER")
    }

    pub(crate) fn app(args: &[&str]) -> App {
        let mut argv = vec!["stock-dash"];
        argv.extend_from_slice(args);
        App::new(&Args::parse_from(argv), Arc::new(provider()))
    }

    pub(crate) fn settle(app: &mut App) {
        for _ in 0..400 {
            app.process_fetch_results();
            if !app.is_fetching() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("fetch did not finish");
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn empty_ticker_warns_without_fetching() {
        let mut app = app(&["--ticker", "  "]);
        app.start_quote_fetch();
        assert!(!app.is_fetching());
        let status = app.status.clone().unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.text, "Please enter a stock ticker symbol.");
    }

    #[test]
    fn successful_fetch_populates_quote() {
        let mut app = app(&["--ticker", "msft"]);
        app.start_quote_fetch();
        assert!(app.is_fetching());
        settle(&mut app);

        let report = app.quote.as_ref().unwrap();
        assert_eq!(report.quote.symbol, "MSFT");
        assert_eq!(report.history.bars().len(), 2);
        assert_eq!(app.status.as_ref().unwrap().severity, Severity::Info);
        assert!(app.last_update.is_some());
    }

    #[test]
    fn empty_history_is_informational() {
        let mut app = app(&[]);
        app.start_quote_fetch();
        settle(&mut app);

        assert_eq!(app.quote.as_ref().unwrap().history, HistoryOutcome::NoData);
        let status = app.status.clone().unwrap();
        assert_eq!(status.severity, Severity::Info);
        assert_eq!(status.text, "No historical data for AAPL (5d).");
    }

    #[test]
    fn failure_keeps_previous_quote_and_reports_cause() {
        let mut app = app(&["--ticker", "MSFT"]);
        app.start_quote_fetch();
        settle(&mut app);

        app.ticker = "badticker".into();
        app.start_quote_fetch();
        settle(&mut app);

        assert_eq!(app.quote.as_ref().unwrap().quote.symbol, "MSFT");
        let status = app.status.clone().unwrap();
        assert_eq!(status.severity, Severity::Error);
        assert!(status
            .text
            .starts_with("Error fetching data for BADTICKER: Quote not found for symbol: BADTICKER"));
    }

    #[test]
    fn superseded_quote_fetch_is_discarded() {
        let mut app = app(&["--ticker", "AAPL"]);
        app.start_quote_fetch();
        let stale = app.pending_quote.unwrap();
        app.ticker = "MSFT".into();
        app.start_quote_fetch();
        settle(&mut app);
        assert_eq!(app.quote.as_ref().unwrap().quote.symbol, "MSFT");

        // A late result from the first request must not replace the newer one.
        let late = fetch_quote(&provider(), "AAPL", Period::FiveDays);
        app.fetch_sender
            .send(FetchMessage::Quote { request: stale, result: late })
            .unwrap();
        assert!(!app.process_fetch_results());
        assert_eq!(app.quote.as_ref().unwrap().quote.symbol, "MSFT");
        assert_eq!(app.status.as_ref().unwrap().text, "Updated MSFT");
    }

    #[test]
    fn superseded_portfolio_fetch_is_discarded() {
        let mut app = app(&["--portfolio", "AAPL"]);
        app.start_portfolio_fetch();
        let stale = app.pending_portfolio.unwrap();
        app.portfolio_input = "MSFT".into();
        app.start_portfolio_fetch();
        settle(&mut app);

        let late = aggregate(&provider(), &["AAPL".to_string()]);
        app.fetch_sender
            .send(FetchMessage::Portfolio { request: stale, result: late })
            .unwrap();
        assert!(!app.process_fetch_results());
        let tickers: Vec<&str> = app
            .portfolio
            .as_ref()
            .unwrap()
            .rows
            .iter()
            .map(|r| r.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["MSFT"]);
    }

    #[test]
    fn portfolio_skips_failures_in_order() {
        let mut app = app(&["--portfolio", "aapl, BADTICKER ,msft"]);
        app.start_portfolio_fetch();
        settle(&mut app);

        let report = app.portfolio.as_ref().unwrap();
        let tickers: Vec<&str> = report.rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(report.warnings.len(), 1);
        let status = app.status.clone().unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert!(status.text.contains("BADTICKER"));
    }

    #[test]
    fn blank_portfolio_list_warns() {
        let mut app = app(&["--portfolio", ",, ,"]);
        app.start_portfolio_fetch();
        assert!(!app.is_fetching());
        assert!(app.portfolio.is_none());
        let status = app.status.clone().unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert_eq!(status.text, "No valid tickers entered");
    }

    #[test]
    fn all_failed_portfolio_keeps_warnings() {
        let mut app = app(&["--portfolio", "BADTICKER,NOPE"]);
        app.start_portfolio_fetch();
        settle(&mut app);

        let report = app.portfolio.as_ref().unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(app.status.as_ref().unwrap().severity, Severity::Error);
    }

    #[test]
    fn editing_ticker_submits_uppercase() {
        let mut app = app(&[]);
        assert_eq!(app.handle_input(KeyCode::Char('/')), Action::None);
        assert_eq!(app.input_mode, InputMode::EditTicker("AAPL".into()));
        for _ in 0..4 {
            app.handle_input(KeyCode::Backspace);
        }
        type_text(&mut app, "msft");
        assert_eq!(app.handle_input(KeyCode::Enter), Action::FetchQuote);
        assert_eq!(app.ticker, "MSFT");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn escape_cancels_edit() {
        let mut app = app(&[]);
        app.handle_input(KeyCode::Char('i'));
        type_text(&mut app, "X");
        assert_eq!(app.handle_input(KeyCode::Esc), Action::None);
        assert_eq!(app.ticker, "AAPL");
    }

    #[test]
    fn period_keys_refetch_on_quote_tab_only() {
        let mut app = app(&[]);
        assert_eq!(app.handle_input(KeyCode::Char(']')), Action::FetchQuote);
        assert_eq!(app.period, Period::OneMonth);
        assert_eq!(app.handle_input(KeyCode::Left), Action::FetchQuote);
        assert_eq!(app.period, Period::FiveDays);

        app.handle_input(KeyCode::Tab);
        assert_eq!(app.tab, Tab::Portfolio);
        assert_eq!(app.handle_input(KeyCode::Char(']')), Action::None);
        assert_eq!(app.period, Period::FiveDays);
    }

    #[test]
    fn portfolio_edit_and_refresh_actions() {
        let mut app = app(&[]);
        app.handle_input(KeyCode::Tab);
        app.handle_input(KeyCode::Char('/'));
        type_text(&mut app, "aapl, msft");
        assert_eq!(app.handle_input(KeyCode::Enter), Action::FetchPortfolio);
        assert_eq!(app.portfolio_input, "aapl, msft");
        assert_eq!(app.handle_input(KeyCode::Char('r')), Action::FetchPortfolio);
        assert_eq!(app.handle_input(KeyCode::Char('c')), Action::None);
        assert_eq!(app.chart_kind, ChartKind::Candlestick);
        assert_eq!(app.handle_input(KeyCode::Char('q')), Action::Quit);
    }
}
