mod tui_app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use tui_app::{
    format_share, intensity_bar, truncate, zone_name, AppState, ConnectionStatus, FillResponse,
    HeatmapResponse,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(1);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char(' ') => {
                            app.toggle_clock(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState) {
    let area = f.area();

    // Outer vertical split: header | body | suspensions | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(4), // suspensions
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_body(f, app, chunks[1]);
    render_suspensions(f, app, chunks[2]);
    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let s = &app.session;
    let board = app.report.scoreboard;
    let clock_color = if s.clock.running { Color::Green } else { Color::DarkGray };
    let zone = s.selected_label.clone().unwrap_or_else(|| "—".to_string());

    let title_spans = vec![
        Span::styled(
            format!(" {}  ", truncate(&s.info.title, 24)),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(s.clock.label.clone(), Style::default().fg(clock_color).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {}", s.period)),
        Span::raw("  │  "),
        Span::styled(
            format!(
                "{} {} : {} {}",
                truncate(&s.info.ally_name, 12),
                board.ally.total,
                board.opponent.total,
                truncate(&s.info.opponent_name, 12)
            ),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                " ({}-{}, {}-{})",
                board.ally.first, board.opponent.first, board.ally.second, board.opponent.second
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  │  "),
        Span::styled(format!("zone {zone}"), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} events ({} unsynced)", s.event_count, s.unarchived),
            Style::default().fg(Color::White),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, area: Rect) {
    // Horizontal split: comparison (34%) | ally heatmap | opponent heatmap
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    render_comparison(f, app, columns[0]);
    let s = &app.session;
    let ally_title = format!(" {} · GK {} ", s.info.ally_name, keeper(&s.active_goalkeepers.ally));
    let opp_title = format!(" {} · GK {} ", s.info.opponent_name, keeper(&s.active_goalkeepers.opponent));
    render_heatmap(f, &app.ally_heatmap, &ally_title, columns[1]);
    render_heatmap(f, &app.opponent_heatmap, &opp_title, columns[2]);
}

fn header_row(titles: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = titles
        .iter()
        .map(|h| Cell::from(h.to_string()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)))
        .collect();
    Row::new(cells).height(1)
}

fn titled_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_comparison(f: &mut Frame, app: &AppState, area: Rect) {
    let s = &app.session;
    let ally = truncate(&s.info.ally_name, 9);
    let opponent = truncate(&s.info.opponent_name, 9);
    let header = header_row(&["Metric", ally.as_str(), opponent.as_str()]);

    let rows: Vec<Row> = app
        .comparison_rows()
        .into_iter()
        .map(|(label, ally, opp)| {
            Row::new(vec![
                Cell::from(label).style(Style::default().fg(Color::DarkGray)),
                Cell::from(ally).style(Style::default().fg(Color::Green)),
                Cell::from(opp).style(Style::default().fg(Color::Red)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(14), Constraint::Length(9), Constraint::Length(9)],
    )
    .header(header)
    .block(titled_block(" TEAM STATS ".to_string()));

    f.render_widget(table, area);
}

fn render_heatmap(f: &mut Frame, map: &HeatmapResponse, title: &str, area: Rect) {
    let header = header_row(&["Zone", "N", "Share", "Intensity", "Conv"]);

    let rows: Vec<Row> = map
        .cells
        .iter()
        .map(|c| {
            let color = match c.fill {
                FillResponse::NoData => Color::DarkGray,
                FillResponse::Intensity(b) if b >= 7 => Color::Red,
                FillResponse::Intensity(b) if b >= 4 => Color::Yellow,
                FillResponse::Intensity(_) => Color::Blue,
            };
            let conversion = c.label.as_ref().map_or("—".to_string(), |l| format!("{l}%"));
            Row::new(vec![
                Cell::from(zone_name(c.zone)),
                Cell::from(c.events.to_string()),
                Cell::from(format_share(c.share)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(intensity_bar(c.fill)).style(Style::default().fg(color)),
                Cell::from(conversion),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Min(10),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(titled_block(format!("{title}({} events) ", map.total)));

    f.render_widget(table, area);
}

fn render_suspensions(f: &mut Frame, app: &AppState, area: Rect) {
    let spans: Vec<Span> = if app.session.suspensions.is_empty() {
        vec![Span::styled("none", Style::default().fg(Color::DarkGray))]
    } else {
        app.session
            .suspensions
            .iter()
            .flat_map(|s| {
                let color = if s.team == "ally" { Color::Green } else { Color::Red };
                [
                    Span::styled(format!("#{}", s.player), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                    Span::raw(format!(" {}   ", s.remaining_label)),
                ]
            })
            .collect()
    };

    let paragraph = Paragraph::new(Line::from(spans)).block(titled_block(" 2-MIN SUSPENSIONS ".to_string()));
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[space] ", Style::default().fg(Color::Yellow)),
        Span::raw("start/stop clock  "),
        Span::styled("auto-refresh: 1s", Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn keeper(number: &Option<String>) -> String {
    number.as_deref().map_or("—".to_string(), |n| format!("#{n}"))
}
