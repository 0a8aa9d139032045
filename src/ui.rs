use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Rectangle},
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs, Wrap,
    },
    Frame,
};

use crate::app::{App, InputMode, Severity, Tab};
use crate::fetch::QuoteReport;
use crate::history::{summarize, ChartKind, HistoryBar};
use crate::period::{Interval, Period};
use crate::portfolio::COLUMNS;
use crate::quote::DisplayQuote;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    match app.tab {
        Tab::Quote => render_quote_tab(f, app, chunks[1]),
        Tab::Portfolio => render_portfolio_tab(f, app, chunks[1]),
    }
    render_status(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let selected = match app.tab {
        Tab::Quote => 0,
        Tab::Portfolio => 1,
    };
    let tabs = Tabs::new(vec![" Quote ", " Portfolio "])
        .block(Block::default().borders(Borders::ALL).title(" Stock Dashboard "))
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, area);
}

/// Single-line input box with a block cursor while editing.
fn input_box<'a>(title: &'a str, value: &str, editing: bool) -> Paragraph<'a> {
    let (text, border) = if editing {
        (format!("{}█", value), Style::default().fg(Color::Yellow))
    } else {
        (value.to_string(), Style::default())
    };
    Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border),
    )
}

fn render_quote_tab(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Ticker + period
            Constraint::Length(3), // Metric tiles
            Constraint::Min(10),   // Details + chart
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(20)])
        .split(chunks[0]);

    let (ticker, editing) = match &app.input_mode {
        InputMode::EditTicker(buffer) => (buffer.as_str(), true),
        _ => (app.ticker.as_str(), false),
    };
    f.render_widget(input_box(" Ticker ", ticker, editing), top[0]);
    render_period_selector(f, app.period, top[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(30)])
        .split(chunks[2]);

    match &app.quote {
        Some(report) => {
            render_tiles(f, &report.quote, chunks[1]);
            render_details(f, &report.quote, body[0]);
            render_chart(f, report, app.chart_kind, body[1]);
        }
        None => {
            let hint = Paragraph::new("  Press / to enter a ticker, Enter to fetch")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(" Stock Details "));
            f.render_widget(hint, body[0]);
            f.render_widget(
                Block::default().borders(Borders::ALL).title(" Price History "),
                body[1],
            );
        }
    }
}

fn render_period_selector(f: &mut Frame, period: Period, area: Rect) {
    let periods = Period::all();
    let selected = periods.iter().position(|p| *p == period).unwrap_or(0);
    let titles: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Period [ ] "))
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider(" ");
    f.render_widget(tabs, area);
}

fn change_color(direction: Option<f64>) -> Color {
    match direction {
        Some(c) if c > 0.0 => Color::Green,
        Some(c) if c < 0.0 => Color::Red,
        _ => Color::White,
    }
}

fn render_tiles(f: &mut Frame, quote: &DisplayQuote, area: Rect) {
    let tiles = [
        ("Price", quote.current_price.as_str(), Color::White),
        ("Change", quote.change.as_str(), change_color(quote.direction)),
        ("Market Cap", quote.market_cap.as_str(), Color::White),
        ("P/E (TTM)", quote.pe_ratio.as_str(), Color::White),
        ("Div Yield", quote.dividend_yield.as_str(), Color::White),
        ("Beta", quote.beta.as_str(), Color::White),
    ];
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(tiles.iter().map(|_| Constraint::Ratio(1, tiles.len() as u32)))
        .split(area);

    for ((label, value, color), chunk) in tiles.iter().zip(chunks.iter()) {
        let tile = Paragraph::new(Line::from(*value).alignment(Alignment::Center))
            .style(Style::default().fg(*color).bold())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", label))
                    .title_style(Style::default().fg(Color::Gray)),
            );
        f.render_widget(tile, *chunk);
    }
}

fn render_details(f: &mut Frame, quote: &DisplayQuote, area: Rect) {
    let label_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = quote
        .fields()
        .into_iter()
        .map(|(label, value)| {
            let value_style = if label == "Change" {
                Style::default().fg(change_color(quote.direction))
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" {:<18}", format!("{}:", label)), label_style),
                Span::styled(value.to_string(), value_style),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}) ", quote.title(), quote.symbol))
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn time_label(bar: &HistoryBar, interval: Interval) -> String {
    let local = bar.timestamp.with_timezone(&Local);
    if interval.is_intraday() {
        local.format("%m-%d %H:%M").to_string()
    } else {
        local.format("%Y-%m-%d").to_string()
    }
}

fn render_chart(f: &mut Frame, report: &QuoteReport, kind: ChartKind, area: Rect) {
    let style_name = match kind {
        ChartKind::Line => "Close",
        ChartKind::Candlestick => "OHLC",
    };
    let title = format!(
        " {} {} ({} @ {}) ",
        report.quote.symbol, style_name, report.query.period, report.query.interval
    );
    let bars = report.history.bars();

    if bars.is_empty() {
        let no_data = Paragraph::new("  No historical data available for this period.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(no_data, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(5)])
        .split(area);

    if let Some(summary) = summarize(bars) {
        let color = if summary.change >= 0.0 { Color::Green } else { Color::Red };
        let pct = summary
            .change_percent
            .map(|p| format!(" ({:+.2}%)", p))
            .unwrap_or_default();
        let line = Line::from(vec![
            Span::styled(format!("  High: {:.2}", summary.high), Style::default().fg(Color::Green)),
            Span::raw("  |  "),
            Span::styled(format!("Low: {:.2}", summary.low), Style::default().fg(Color::Red)),
            Span::raw("  |  "),
            Span::styled(format!("Change: {:+.2}{}", summary.change, pct), Style::default().fg(color)),
        ]);
        f.render_widget(Paragraph::new(line), chunks[0]);
    }

    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((high - low) * 0.05).max(high.abs() * 0.001).max(0.01);
    let (min_y, max_y) = (low - pad, high + pad);
    let max_x = bars.len() as f64;

    let first_label = bars.first().map(|b| time_label(b, report.query.interval)).unwrap_or_default();
    let last_label = bars.last().map(|b| time_label(b, report.query.interval)).unwrap_or_default();
    let block = Block::default().borders(Borders::ALL).title(title);

    match kind {
        ChartKind::Line => {
            let data: Vec<(f64, f64)> = bars
                .iter()
                .enumerate()
                .map(|(i, b)| (i as f64 + 0.5, b.close))
                .collect();

            let datasets = vec![Dataset::default()
                .name("Close")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&data)];

            let chart = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .title("Date")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([0.0, max_x])
                        .labels(vec![Span::raw(first_label), Span::raw(last_label)]),
                )
                .y_axis(
                    Axis::default()
                        .title("Price")
                        .style(Style::default().fg(Color::Gray))
                        .bounds([min_y, max_y])
                        .labels(vec![
                            Span::raw(format!("{:.1}", min_y)),
                            Span::raw(format!("{:.1}", max_y)),
                        ]),
                );
            f.render_widget(chart, chunks[1]);
        }
        ChartKind::Candlestick => {
            let canvas = Canvas::default()
                .block(block.title_bottom(format!(" {} .. {} ", first_label, last_label)))
                .marker(symbols::Marker::Braille)
                .x_bounds([0.0, max_x])
                .y_bounds([min_y, max_y])
                .paint(|ctx| {
                    for (i, b) in bars.iter().enumerate() {
                        let color = if b.close >= b.open { Color::Green } else { Color::Red };
                        let mid = i as f64 + 0.5;
                        ctx.draw(&CanvasLine {
                            x1: mid,
                            y1: b.low,
                            x2: mid,
                            y2: b.high,
                            color,
                        });
                        ctx.draw(&Rectangle {
                            x: i as f64 + 0.2,
                            y: b.open.min(b.close),
                            width: 0.6,
                            height: (b.close - b.open).abs(),
                            color,
                        });
                    }
                });
            f.render_widget(canvas, chunks[1]);
        }
    }
}

fn render_portfolio_tab(f: &mut Frame, app: &App, area: Rect) {
    let warning_count = app.portfolio.as_ref().map(|p| p.warnings.len()).unwrap_or(0);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(if warning_count > 0 { warning_count.min(6) as u16 + 2 } else { 0 }),
        ])
        .split(area);

    let (tickers, editing) = match &app.input_mode {
        InputMode::EditPortfolio(buffer) => (buffer.as_str(), true),
        _ => (app.portfolio_input.as_str(), false),
    };
    f.render_widget(input_box(" Tickers (comma-separated) ", tickers, editing), chunks[0]);

    let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let header = Row::new(COLUMNS.to_vec()).style(header_style).height(1);
    let widths = [
        Constraint::Length(8),  // Ticker
        Constraint::Min(16),    // Name
        Constraint::Length(14), // Current Price
        Constraint::Length(18), // Sector
        Constraint::Length(22), // Industry
        Constraint::Length(14), // Country
        Constraint::Length(10), // P/E
        Constraint::Length(15), // Dividend Yield
    ];

    let rows: Vec<Row> = app
        .portfolio
        .as_ref()
        .map(|p| {
            p.rows
                .iter()
                .map(|row| {
                    let cells = row.cells();
                    Row::new(vec![
                        Cell::from(cells[0].to_string()).style(Style::default().fg(Color::Cyan)),
                        Cell::from(cells[1].to_string()),
                        Cell::from(Line::from(cells[2].to_string()).alignment(Alignment::Right)),
                        Cell::from(cells[3].to_string()),
                        Cell::from(cells[4].to_string()),
                        Cell::from(cells[5].to_string()),
                        Cell::from(Line::from(cells[6].to_string()).alignment(Alignment::Right)),
                        Cell::from(Line::from(cells[7].to_string()).alignment(Alignment::Right)),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();

    let title = match &app.portfolio {
        Some(p) => format!(" Portfolio Overview ({} tickers) ", p.rows.len()),
        None => " Portfolio Overview ".to_string(),
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, chunks[1]);

    if let Some(report) = app.portfolio.as_ref().filter(|p| !p.warnings.is_empty()) {
        let lines: Vec<Line> = report
            .warnings
            .iter()
            .map(|w| Line::from(format!(" {}", w)).style(Style::default().fg(Color::Red)))
            .collect();
        let warnings = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Skipped "));
        f.render_widget(warnings, chunks[2]);
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let (tag, color) = match status.severity {
        Severity::Info => ("INFO", Color::Green),
        Severity::Warning => ("WARN", Color::Yellow),
        Severity::Error => ("ERROR", Color::Red),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", tag), Style::default().fg(Color::Black).bg(color)),
        Span::styled(format!(" {}", status.text), Style::default().fg(color)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let keys = match app.input_mode {
        InputMode::Normal => match app.tab {
            Tab::Quote => " Tab=Portfolio | /=Ticker | [ ]=Period | c=Chart | r=Refresh | q=Quit ",
            Tab::Portfolio => " Tab=Quote | /=Tickers | r=Refresh | q=Quit ",
        },
        _ => " Enter=Fetch | Esc=Cancel ",
    };

    let updated = app
        .last_update
        .map(|t| format!(" Updated: {} ", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let mut spans = vec![
        Span::styled(keys, Style::default().fg(Color::Yellow)),
        Span::styled(updated, Style::default().fg(Color::DarkGray)),
    ];
    if app.is_fetching() {
        spans.push(Span::styled(
            " Fetching...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
