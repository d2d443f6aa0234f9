//! Interactive metrics dashboard
//!
//! One tab per metric kind over a shared filter bar. Key handling only
//! mutates the [`ViewController`]; the event loop executes the reloads it
//! hands back and feeds completions in as they arrive, so the UI stays
//! responsive while fetches are in flight.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use devinsight_core::format::{
    change_class, complexity_band, complexity_ratio, format_additions, format_complexity,
    format_deletions, format_grouped, format_net, format_number, format_ratio, net_churn,
    risk_score, ChangeClass, ComplexityBand,
};
use devinsight_core::records::{ChurnRecord, ComplexityRecord, HotspotRecord, RiskLevel};
use devinsight_core::registry::PendingReload;
use devinsight_core::{
    HttpTransport, MetricKind, Orchestrator, Records, ViewController, ViewState,
};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use std::io;
use std::time::Instant;
use tracing::debug;

/// Whether keystrokes go to the filter input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingFilter,
}

pub struct App {
    controller: ViewController,
    input_mode: InputMode,
    filter_input: String,
    base_url: String,
    should_quit: bool,
}

impl App {
    pub fn new(controller: ViewController, base_url: impl Into<String>) -> Self {
        let filter_input = controller.filter().raw_extensions().to_string();
        App {
            controller,
            input_mode: InputMode::Normal,
            filter_input,
            base_url: base_url.into(),
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewController {
        &mut self.controller
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply a key press; returns a reload to execute, if any
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Option<PendingReload> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match self.input_mode {
            InputMode::EditingFilter => self.on_filter_key(key, now),
            InputMode::Normal => self.on_normal_key(key),
        }
    }

    fn on_normal_key(&mut self, key: KeyEvent) -> Option<PendingReload> {
        let active = self.controller.active().index();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                self.controller.activate_tab(MetricKind::ALL[index])
            }
            KeyCode::Tab => {
                let next = MetricKind::ALL[(active + 1) % MetricKind::ALL.len()];
                self.controller.activate_tab(next)
            }
            KeyCode::BackTab => {
                let len = MetricKind::ALL.len();
                self.controller.activate_tab(MetricKind::ALL[(active + len - 1) % len])
            }
            KeyCode::Left | KeyCode::Char('p') => self.controller.previous_page(),
            KeyCode::Right | KeyCode::Char('n') => self.controller.next_page(),
            KeyCode::Char('l') => {
                let next = self.controller.filter().limit().cycle();
                self.controller.set_limit(next)
            }
            KeyCode::Char('r') => Some(self.controller.refresh()),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::EditingFilter;
                None
            }
            _ => None,
        }
    }

    fn on_filter_key(&mut self, key: KeyEvent, now: Instant) -> Option<PendingReload> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            KeyCode::Backspace => {
                self.filter_input.pop()?;
                self.controller.edit_filter(&self.filter_input, now)
            }
            KeyCode::Char(c) => {
                self.filter_input.push(c);
                self.controller.edit_filter(&self.filter_input, now)
            }
            _ => None,
        }
    }
}

/// Put the terminal into raw mode on the alternate screen
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the dashboard until the user quits
pub async fn run(app: App, orchestrator: &Orchestrator<HttpTransport>) -> io::Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, app, orchestrator).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    orchestrator: &Orchestrator<HttpTransport>,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut in_flight = FuturesUnordered::new();
    in_flight.push(app.controller.mount().execute(orchestrator));

    loop {
        terminal.draw(|frame| ui(frame, &app))?;

        let deadline = app.controller.debounce_deadline();
        let wake_at = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            Some(completion) = in_flight.next(), if !in_flight.is_empty() => {
                let applied = app.controller.complete(completion);
                debug!(?applied, "fetch finished");
            }
            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                if let Some(pending) = app.controller.poll_debounce(Instant::now()) {
                    in_flight.push(pending.execute(orchestrator));
                }
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if let Some(pending) = app.on_key(key, Instant::now()) {
                            in_flight.push(pending.execute(orchestrator));
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e),
                    None => break,
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Render a full frame
pub fn ui(frame: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, chunks[0], app);
    render_filter_bar(frame, chunks[1], app);
    render_body(frame, chunks[2], app);
    render_footer(frame, chunks[3], app);
}

fn render_tabs(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let titles: Vec<Line<'_>> = MetricKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| Line::from(format!("{} {}", i + 1, kind.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.controller.active().index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" DevInsight · {} ", app.base_url)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    frame.render_widget(tabs, area);
}

fn render_filter_bar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let filter = app.controller.filter();
    let editing = app.input_mode == InputMode::EditingFilter;
    let input_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let shown = if app.filter_input.is_empty() && !editing {
        "all files".to_string()
    } else if editing {
        format!("{}_", app.filter_input)
    } else {
        app.filter_input.clone()
    };

    let line = Line::from(vec![
        Span::raw("Extensions: "),
        Span::styled(shown, input_style),
        Span::raw(format!(
            "   Page {}   {} per page",
            filter.page(),
            filter.limit()
        )),
    ]);
    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Filter "));
    frame.render_widget(bar, area);
}

fn render_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.controller.active().label()));

    match app.controller.view() {
        ViewState::Idle => {
            let text = Paragraph::new("Press r to load").block(block);
            frame.render_widget(text, area);
        }
        ViewState::Loading => {
            let text = Paragraph::new(Span::styled(
                "Loading...",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            frame.render_widget(text, area);
        }
        ViewState::Failed(message) => {
            let text = Paragraph::new(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            ))
            .wrap(Wrap { trim: true })
            .block(block);
            frame.render_widget(text, area);
        }
        ViewState::Empty(notice) => {
            let text = Paragraph::new(vec![
                Line::from(Span::styled(
                    notice.title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(notice.hint, Style::default().fg(Color::DarkGray))),
            ])
            .block(block);
            frame.render_widget(text, area);
        }
        ViewState::Table(records) => {
            let table = match records {
                Records::Churn(rows) => churn_table(rows),
                Records::Complexity(rows) => complexity_table(rows),
                Records::Hotspots(rows) => hotspot_table(rows),
            };
            frame.render_widget(table.block(block), area);
        }
    }
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().copied().map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD))
}

fn churn_table(rows: &[ChurnRecord]) -> Table<'static> {
    let body = rows.iter().map(|r| {
        let net = net_churn(r);
        let net_color = match change_class(net) {
            ChangeClass::Positive => Color::Green,
            ChangeClass::Negative => Color::Red,
        };
        Row::new(vec![
            Cell::from(r.file.clone()),
            Cell::from(format_grouped(r.commits)),
            Cell::from(format_additions(r)).style(Style::default().fg(Color::Green)),
            Cell::from(format_deletions(r)).style(Style::default().fg(Color::Red)),
            Cell::from(format_net(net)).style(Style::default().fg(net_color)),
        ])
    });
    Table::new(
        body,
        [
            Constraint::Min(30),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header(&["File", "Commits", "Added", "Deleted", "Net"]))
}

fn complexity_table(rows: &[ComplexityRecord]) -> Table<'static> {
    let body = rows.iter().map(|r| {
        let band_color = match complexity_band(r.complexity) {
            ComplexityBand::Low => Color::Green,
            ComplexityBand::Medium => Color::Yellow,
            ComplexityBand::High => Color::Red,
        };
        Row::new(vec![
            Cell::from(r.file.clone()),
            Cell::from(format_complexity(r.complexity)).style(Style::default().fg(band_color)),
            Cell::from(format_grouped(r.lines)),
            Cell::from(format_grouped(r.functions)),
            Cell::from(format_ratio(complexity_ratio(r))),
        ])
    });
    Table::new(
        body,
        [
            Constraint::Min(30),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header(&["File", "Complexity", "Lines", "Functions", "Ratio"]))
}

fn hotspot_table(rows: &[HotspotRecord]) -> Table<'static> {
    let body = rows.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.file.clone()),
            Cell::from(format_grouped(r.commits)),
            Cell::from(format_number(r.complexity)),
            Cell::from(format_number(risk_score(r))),
            Cell::from(r.risk_level.clone()).style(Style::default().fg(risk_color(r))),
        ])
    });
    Table::new(
        body,
        [
            Constraint::Min(30),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header(&["File", "Commits", "Complexity", "Risk Score", "Risk Level"]))
}

/// Server-provided color when it parses, otherwise derived from the risk label
fn risk_color(record: &HotspotRecord) -> Color {
    if let Ok(color) = record.color.parse::<Color>() {
        return color;
    }
    match record.risk() {
        Some(RiskLevel::High) => Color::Red,
        Some(RiskLevel::Medium) => Color::Yellow,
        Some(RiskLevel::Low) => Color::Green,
        None => Color::Reset,
    }
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Cyan);
    let dim = Style::default().fg(Color::DarkGray);
    let previous = if app.controller.filter().can_go_previous() {
        Span::styled("[p] Previous", key)
    } else {
        Span::styled("[p] Previous", dim.add_modifier(Modifier::CROSSED_OUT))
    };

    let help = match app.input_mode {
        InputMode::EditingFilter => Line::from(vec![
            Span::styled("typing filter", Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled("[Enter/Esc] done", key),
        ]),
        InputMode::Normal => Line::from(vec![
            Span::styled("[1-3/Tab] tabs", key),
            Span::raw("  "),
            previous,
            Span::raw("  "),
            Span::styled("[n] Next", key),
            Span::raw("  "),
            Span::styled("[l] page size", key),
            Span::raw("  "),
            Span::styled("[/] filter", key),
            Span::raw("  "),
            Span::styled("[r] refresh", key),
            Span::raw("  "),
            Span::styled("[q] quit", key),
        ]),
    };
    frame.render_widget(Paragraph::new(help), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use devinsight_core::controller::ControllerSettings;
    use devinsight_core::debounce::DebouncePolicy;
    use devinsight_core::error::FetchError;
    use devinsight_core::registry::Completion;
    use ratatui::backend::TestBackend;
    use std::time::Duration;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(ViewController::default(), "http://127.0.0.1:8000")
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| ui(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn load(app: &mut App, result: Result<Records, FetchError>) {
        let pending = app.controller_mut().refresh();
        app.controller_mut().complete(Completion {
            ticket: pending.ticket,
            result,
        });
    }

    #[test]
    fn test_number_keys_switch_tabs() {
        let mut app = app();
        let pending = app.on_key(press(KeyCode::Char('2')), Instant::now());
        assert_eq!(pending.unwrap().ticket.kind, MetricKind::Churn);
        assert_eq!(app.controller().active(), MetricKind::Churn);

        // Same tab again is not a change
        assert!(app.on_key(press(KeyCode::Char('2')), Instant::now()).is_none());
    }

    #[test]
    fn test_previous_on_first_page_does_nothing() {
        let mut app = app();
        assert!(app.on_key(press(KeyCode::Char('p')), Instant::now()).is_none());
        let next = app.on_key(press(KeyCode::Right), Instant::now()).unwrap();
        assert_eq!(next.request.param("page"), Some("2"));
        let back = app.on_key(press(KeyCode::Left), Instant::now()).unwrap();
        assert_eq!(back.request.param("page"), Some("1"));
    }

    #[test]
    fn test_limit_key_cycles_and_resets_page() {
        let mut app = app();
        app.on_key(press(KeyCode::Char('n')), Instant::now());
        let pending = app.on_key(press(KeyCode::Char('l')), Instant::now()).unwrap();
        assert_eq!(pending.request.param("limit"), Some("25"));
        assert_eq!(pending.request.param("page"), Some("1"));
    }

    #[test]
    fn test_filter_typing_is_debounced() {
        let mut app = app();
        let start = Instant::now();
        assert!(app.on_key(press(KeyCode::Char('/')), start).is_none());
        assert_eq!(app.input_mode(), InputMode::EditingFilter);

        for c in ['r', 's'] {
            assert!(app.on_key(press(KeyCode::Char(c)), start).is_none());
        }
        // 'q' is text while editing
        assert!(app.on_key(press(KeyCode::Char('q')), start).is_none());
        assert!(!app.should_quit());
        app.on_key(press(KeyCode::Backspace), start);

        let due = app.controller().debounce_deadline().unwrap();
        let pending = app.controller_mut().poll_debounce(due).unwrap();
        assert_eq!(pending.request.param("ext"), Some("rs"));

        app.on_key(press(KeyCode::Enter), start);
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn test_filter_typing_without_debounce_reloads_each_key() {
        let settings = ControllerSettings {
            debounce: DebouncePolicy::new(Duration::ZERO),
            ..ControllerSettings::default()
        };
        let mut app = App::new(ViewController::new(settings), "http://localhost");
        app.on_key(press(KeyCode::Char('/')), Instant::now());
        let pending = app.on_key(press(KeyCode::Char('r')), Instant::now()).unwrap();
        assert_eq!(pending.request.param("ext"), Some("r"));
        assert!(app.controller().debounce_deadline().is_none());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.on_key(press(KeyCode::Char('q')), Instant::now());
        assert!(app.should_quit());

        let mut app = self::app();
        app.on_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(app.should_quit());
    }

    #[test]
    fn test_renders_churn_table() {
        let mut app = app();
        app.on_key(press(KeyCode::Char('2')), Instant::now());
        load(
            &mut app,
            Ok(Records::Churn(vec![ChurnRecord {
                file: "src/app.py".to_string(),
                commits: 12,
                additions: 340,
                deletions: 120,
            }])),
        );

        let screen = render(&app);
        assert!(screen.contains("Churn Metrics"));
        assert!(screen.contains("src/app.py"));
        assert!(screen.contains("+340"));
        assert!(screen.contains("-120"));
        assert!(screen.contains("+220"));
        assert!(screen.contains("Page 1"));
    }

    #[test]
    fn test_renders_error_without_stale_rows() {
        let mut app = app();
        load(
            &mut app,
            Ok(Records::Hotspots(vec![HotspotRecord {
                file: "stale.go".to_string(),
                commits: 3,
                complexity: 4.0,
                risk_level: "Low Risk".to_string(),
                color: "green".to_string(),
            }])),
        );
        load(&mut app, Err(FetchError::failed("boom")));

        let screen = render(&app);
        assert!(screen.contains("Error: boom"));
        assert!(!screen.contains("stale.go"));
    }

    #[test]
    fn test_renders_empty_notice() {
        let mut app = app();
        app.on_key(press(KeyCode::Char('3')), Instant::now());
        load(&mut app, Ok(Records::Complexity(Vec::new())));

        let screen = render(&app);
        assert!(screen.contains("No complexity data available"));
        assert!(screen.contains("Make sure you have analyzed a repository first"));
    }

    #[test]
    fn test_risk_color_prefers_server_color() {
        let mut record = HotspotRecord {
            file: "a.rs".to_string(),
            commits: 1,
            complexity: 1.0,
            risk_level: "High Risk".to_string(),
            color: "yellow".to_string(),
        };
        assert_eq!(risk_color(&record), Color::Yellow);
        record.color = "not-a-color".to_string();
        assert_eq!(risk_color(&record), Color::Red);
    }
}
