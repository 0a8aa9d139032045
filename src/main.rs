mod app;
mod cli;
mod error;
mod fetch;
mod history;
mod logging;
mod period;
mod portfolio;
mod provider;
mod quote;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{Action, App};
use crate::cli::Args;
use crate::provider::yahoo::YahooClient;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = logging::init(args.log_file.clone())?;
    info!("starting, logging to {}", log_path.display());

    let provider = Arc::new(YahooClient::new(Duration::from_secs(args.timeout))?);
    let mut app = App::new(&args, provider);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, args.portfolio.is_some());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    load_portfolio: bool,
) -> Result<()> {
    app.start_quote_fetch();
    if load_portfolio {
        app.start_portfolio_fetch();
    }

    loop {
        app.process_fetch_results();

        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_input(key.code),
                _ => Action::None,
            };

            match action {
                Action::Quit => return Ok(()),
                Action::FetchQuote => app.start_quote_fetch(),
                Action::FetchPortfolio => app.start_portfolio_fetch(),
                Action::None => {}
            }
        }
    }
}
