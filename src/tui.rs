use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, ProgressEvent, ProgressSink};
use crate::domain::{SearchQuery, ThemeMode};
use crate::pokeapi::CatalogClient;
use crate::store::EntityStore;

const EVENTS_MAX: usize = 6;
const LOGS_MAX: usize = 200;
const HINTS: &[&str] = &[
    "Tip: press Enter on an empty field to load the default list",
    "Tip: Up/Down select a card, Delete closes it",
    "Tip: F2 toggles light/dark, F5 clears the cache",
    "Tip: F4 shows the request log",
];

type Backend = CrosstermBackend<Stdout>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Cards,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Resolve,
    Cache,
    Fetch,
    Normalize,
    Store,
    Done,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Resolve => "Resolve",
            Phase::Cache => "Cache",
            Phase::Fetch => "Fetch",
            Phase::Normalize => "Normalize",
            Phase::Store => "Store",
            Phase::Done => "Done",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "Resolve" => Some(Phase::Resolve),
            "Cache" => Some(Phase::Cache),
            "Fetch" => Some(Phase::Fetch),
            "Normalize" => Some(Phase::Normalize),
            "Store" => Some(Phase::Store),
            "Done" => Some(Phase::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub muted: Color,
    pub alert: Color,
    pub selection: Color,
}

impl Palette {
    pub fn for_theme(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Light => Self {
                background: Color::White,
                foreground: Color::Black,
                accent: Color::Blue,
                muted: Color::DarkGray,
                alert: Color::Red,
                selection: Color::LightBlue,
            },
            ThemeMode::Dark => Self {
                background: Color::Black,
                foreground: Color::White,
                accent: Color::Cyan,
                muted: Color::Gray,
                alert: Color::LightRed,
                selection: Color::DarkGray,
            },
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    fn label(&self) -> Style {
        Style::default().fg(self.muted)
    }
}

#[derive(Debug)]
struct UiState {
    status: String,
    phase: Phase,
    latency_ms: Option<u128>,
    request_count: u64,
    alert: Option<String>,
    events: VecDeque<String>,
    logs: VecDeque<String>,
    active: bool,
    started: Instant,
    cache_entries: usize,
    hint_index: usize,
    last_hint_update: Instant,
}

enum KeyAction {
    None,
    Quit,
    Submit(String),
    ClearAll,
}

pub struct Tui {
    theme: ThemeMode,
    placeholder: String,
    state: Arc<Mutex<UiState>>,
    input: String,
    selected: usize,
    view: View,
    confirm_clear: bool,
    log_scroll: u16,
}

struct TuiProgress {
    state: Arc<Mutex<UiState>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut state) = self.state.lock() {
            let message = event.message.trim().to_string();
            if let Some(alert) = message.strip_prefix("alert:") {
                state.alert = Some(alert.trim().to_string());
            } else if let Some((phase, payload)) = parse_phase(&message) {
                state.phase = phase;
                state.status = payload.to_string();
            }
            if let Some(elapsed) = event.elapsed {
                state.latency_ms = Some(elapsed.as_millis());
            }

            if message == "pokeapi.request" {
                state.request_count = state.request_count.saturating_add(1);
            } else {
                push_event(&mut state.events, message.clone());
            }
            push_log(&mut state.logs, format!("[{}] {message}", timestamp()));
        }
    }
}

impl Tui {
    pub fn new(theme: ThemeMode, placeholder: impl Into<String>) -> Self {
        Self {
            theme,
            placeholder: placeholder.into(),
            state: Arc::new(Mutex::new(UiState {
                status: "ready".to_string(),
                phase: Phase::Done,
                latency_ms: None,
                request_count: 0,
                alert: None,
                events: VecDeque::new(),
                logs: VecDeque::new(),
                active: false,
                started: Instant::now(),
                cache_entries: 0,
                hint_index: 0,
                last_hint_update: Instant::now(),
            })),
            input: String::new(),
            selected: 0,
            view: View::Cards,
            confirm_clear: false,
            log_scroll: 0,
        }
    }

    pub fn run<C: CatalogClient>(
        &mut self,
        app: &App<C>,
        store: &mut EntityStore,
    ) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal, app, store);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop<C: CatalogClient>(
        &mut self,
        terminal: &mut Terminal<Backend>,
        app: &App<C>,
        store: &mut EntityStore,
    ) -> miette::Result<()> {
        let mut tick = 0usize;
        loop {
            self.refresh(app);
            self.draw(terminal, store, tick)?;

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    match self.handle_key(key, store) {
                        KeyAction::Quit => break,
                        KeyAction::Submit(input) => self.submit(terminal, app, store, &input)?,
                        KeyAction::ClearAll => {
                            let sink = self.sink();
                            match app.clear_all(store, &sink) {
                                Ok(result) => sink.event(ProgressEvent::new(format!(
                                    "phase=Done; cleared {} cache entries",
                                    result.removed_entries
                                ))),
                                Err(err) => sink.event(ProgressEvent::alert(&err)),
                            }
                            self.selected = 0;
                        }
                        KeyAction::None => {}
                    }
                }
            }

            tick = tick.wrapping_add(1);
        }
        Ok(())
    }

    /// Validates on the UI thread, then runs the search on a worker while the
    /// screen keeps redrawing. Keys pressed meanwhile are discarded.
    fn submit<C: CatalogClient>(
        &mut self,
        terminal: &mut Terminal<Backend>,
        app: &App<C>,
        store: &mut EntityStore,
        input: &str,
    ) -> miette::Result<()> {
        let sink = self.sink();
        let query = match input.parse::<SearchQuery>() {
            Ok(query) => query,
            Err(err) => {
                sink.event(ProgressEvent::alert(&err));
                return Ok(());
            }
        };

        self.set_active(true);
        let result = thread::scope(|scope| -> miette::Result<_> {
            let handle = scope.spawn(|| app.search(&query, &sink));
            let mut tick = 0usize;
            while !handle.is_finished() {
                self.draw(terminal, store, tick)?;
                if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                    let _ = event::read().into_diagnostic()?;
                }
                tick = tick.wrapping_add(1);
            }
            Ok(handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
        })?;
        self.set_active(false);

        match result {
            Ok(outcome) => {
                outcome.apply_to(store);
                sink.event(ProgressEvent::new(format!(
                    "phase=Done; {} shown, {} failed",
                    outcome.entities.len(),
                    outcome.failures.len()
                )));
            }
            Err(err) => sink.event(ProgressEvent::alert(&err)),
        }
        Ok(())
    }

    fn draw(
        &self,
        terminal: &mut Terminal<Backend>,
        store: &EntityStore,
        tick: usize,
    ) -> miette::Result<()> {
        let palette = Palette::for_theme(self.theme);
        if let Ok(state) = self.state.lock() {
            terminal
                .draw(|frame| draw_ui(frame, self, &state, store, &palette, tick))
                .into_diagnostic()?;
        }
        Ok(())
    }

    fn sink(&self) -> TuiProgress {
        TuiProgress {
            state: self.state.clone(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut EntityStore) -> KeyAction {
        if key.kind != KeyEventKind::Press {
            return KeyAction::None;
        }

        if self.confirm_clear {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_clear = false;
                    KeyAction::ClearAll
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_clear = false;
                    KeyAction::None
                }
                _ => KeyAction::None,
            };
        }

        match key.code {
            KeyCode::Esc => {
                if self.view != View::Cards {
                    self.view = View::Cards;
                    return KeyAction::None;
                }
                return KeyAction::Quit;
            }
            KeyCode::F(1) => self.view = View::Help,
            KeyCode::F(2) => self.theme = self.theme.toggled(),
            KeyCode::F(4) => self.view = View::Logs,
            KeyCode::F(5) => self.confirm_clear = true,
            KeyCode::Enter => {
                if let Ok(mut state) = self.state.lock() {
                    state.alert = None;
                }
                return KeyAction::Submit(self.input.clone());
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < store.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Delete => {
                let id = store
                    .entities()
                    .nth(self.selected)
                    .map(|entity| entity.id().to_string());
                if let Some(id) = id {
                    store.remove(&id);
                    self.selected = self.selected.min(store.len().saturating_sub(1));
                }
            }
            KeyCode::PageUp => self.scroll_logs(-5),
            KeyCode::PageDown => self.scroll_logs(5),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => {}
        }
        KeyAction::None
    }

    fn set_active(&self, active: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.active = active;
            if active {
                state.started = Instant::now();
                state.request_count = 0;
                state.latency_ms = None;
                state.phase = Phase::Resolve;
            }
        }
    }

    fn refresh<C: CatalogClient>(&self, app: &App<C>) {
        if let Ok(mut state) = self.state.lock() {
            if state.last_hint_update.elapsed() >= Duration::from_secs(5) {
                state.hint_index = (state.hint_index + 1) % HINTS.len().max(1);
                state.last_hint_update = Instant::now();
            }
            if let Ok(count) = app.cache().entry_count() {
                state.cache_entries = count;
            }
        }
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max = self.state.lock().map(|state| state.logs.len()).unwrap_or(0);
        let max_scroll = max.saturating_sub(1) as i16;
        let next = (self.log_scroll as i16 + delta).clamp(0, max_scroll);
        self.log_scroll = next as u16;
    }
}

fn draw_ui(
    frame: &mut ratatui::Frame,
    tui: &Tui,
    state: &UiState,
    store: &EntityStore,
    palette: &Palette,
    tick: usize,
) {
    frame.render_widget(Block::default().style(palette.base()), frame.area());
    match tui.view {
        View::Cards => draw_cards_view(frame, tui, state, store, palette, tick),
        View::Logs => draw_logs(frame, tui, state, store, palette, tick),
        View::Help => draw_help(frame, palette),
    }
    if tui.confirm_clear {
        draw_confirm_clear(frame, palette);
    }
}

fn draw_cards_view(
    frame: &mut ratatui::Frame,
    tui: &Tui,
    state: &UiState,
    store: &EntityStore,
    palette: &Palette,
    tick: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(tui, state, store, palette, tick), chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    draw_entity_cards(frame, tui, store, palette, main[0]);
    frame.render_widget(draw_status_panel(state, palette), main[1]);

    draw_search_line(frame, tui, state, palette, chunks[2]);
}

fn draw_entity_cards(
    frame: &mut ratatui::Frame,
    tui: &Tui,
    store: &EntityStore,
    palette: &Palette,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .title(Span::styled("ENTITIES", palette.title()));

    if store.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Nothing loaded yet. Type a name and press Enter.",
                palette.label(),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let items = store
        .entities()
        .map(|entity| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("Name: {}", entity.name()),
                    palette.title(),
                )),
                Line::from(vec![
                    Span::styled("Forms amount: ", palette.label()),
                    Span::raw(entity.forms_amount().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Forms names: ", palette.label()),
                    Span::raw(entity.forms_names().to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Image: ", palette.label()),
                    Span::raw(entity.image_url().unwrap_or("n/a").to_string()),
                ]),
                Line::from(""),
            ])
        })
        .collect::<Vec<_>>();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.selection))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(tui.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_logs(
    frame: &mut ratatui::Frame,
    tui: &Tui,
    state: &UiState,
    store: &EntityStore,
    palette: &Palette,
    tick: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(tui, state, store, palette, tick), chunks[0]);
    frame.render_widget(draw_logs_view(state, tui.log_scroll, palette), chunks[1]);
    draw_search_line(frame, tui, state, palette, chunks[2]);
}

fn draw_help(frame: &mut ratatui::Frame, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Help", palette.title()));
    let lines = vec![
        Line::from("Enter   search (empty field loads the default list)"),
        Line::from("Up/Down select a card   Delete close the selected card"),
        Line::from("F1 Help  F2 Theme  F4 Logs  F5 Clear cache  Esc Back/Quit"),
        Line::from("Names are letters only, e.g. pikachu or Eevee"),
    ];
    let view = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}

fn draw_confirm_clear(frame: &mut ratatui::Frame, palette: &Palette) {
    let area = centered(frame.area(), 44, 5);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled("Confirm", palette.title()))
        .style(palette.base());
    let text = Paragraph::new(vec![
        Line::from("Clear the cache and every card?"),
        Line::from("Press y to confirm, n to cancel."),
    ])
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(Clear, area);
    frame.render_widget(text, area);
}

fn draw_header(
    tui: &Tui,
    state: &UiState,
    store: &EntityStore,
    palette: &Palette,
    tick: usize,
) -> Paragraph<'static> {
    let hb = if state.active && tick % 2 == 0 {
        "*"
    } else {
        " "
    };
    let header_line = Line::from(vec![
        Span::styled("POKE-SEARCH", palette.title()),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), palette.label()),
        Span::raw("   Theme: "),
        Span::styled(tui.theme.to_string(), Style::default().fg(palette.accent)),
        Span::raw("   "),
        Span::styled(hb, Style::default().fg(Color::Green)),
    ]);
    let store_line = Line::from(vec![Span::styled(
        format!(
            "Cards: {}   Cache: {} entries",
            store.len(),
            state.cache_entries
        ),
        palette.label(),
    )]);
    Paragraph::new(vec![header_line, store_line])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_status_panel(state: &UiState, palette: &Palette) -> Paragraph<'static> {
    let phase_color = if state.active {
        palette.accent
    } else {
        Color::Green
    };
    let latency = state
        .latency_ms
        .map(|v| format!("{v} ms"))
        .unwrap_or_else(|| "--".to_string());
    let elapsed = if state.active {
        format!("{:.1}s", state.started.elapsed().as_secs_f64())
    } else {
        "--".to_string()
    };
    let mut lines = vec![
        Line::from(Span::styled("STATUS", palette.title())),
        Line::from(vec![
            Span::styled("Phase: ", palette.label()),
            Span::styled(state.phase.label(), Style::default().fg(phase_color)),
        ]),
        Line::from(vec![
            Span::styled("Status: ", palette.label()),
            Span::raw(state.status.clone()),
        ]),
        Line::from(vec![
            Span::styled("Requests: ", palette.label()),
            Span::raw(state.request_count.to_string()),
            Span::styled("   Latency: ", palette.label()),
            Span::raw(latency),
        ]),
        Line::from(vec![
            Span::styled("Elapsed: ", palette.label()),
            Span::raw(elapsed),
        ]),
        Line::from(Span::styled("Recent events:", palette.label())),
    ];

    for event in state.events.iter().rev().take(4) {
        lines.push(Line::from(format!("- {event}")));
    }
    lines.push(Line::from(vec![
        Span::styled("Hint: ", palette.label()),
        Span::styled(HINTS[state.hint_index], palette.label()),
    ]));

    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn draw_search_line(
    frame: &mut ratatui::Frame,
    tui: &Tui,
    state: &UiState,
    palette: &Palette,
    area: Rect,
) {
    let prefix = "> ";
    let input = if tui.input.is_empty() {
        Span::styled(tui.placeholder.clone(), palette.label())
    } else {
        Span::styled(tui.input.clone(), Style::default().fg(palette.foreground))
    };
    let feedback = match &state.alert {
        Some(alert) => Line::from(Span::styled(
            format!("! {alert}"),
            Style::default()
                .fg(palette.alert)
                .add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled(
            format!("= {}", search_preview(&tui.input)),
            palette.label(),
        )),
    };
    let mut lines = vec![
        Line::from(vec![Span::styled(prefix, palette.title()), input]),
        feedback,
    ];
    if tui.view == View::Logs {
        lines.push(Line::from(Span::styled(
            "Logs: PgUp/PgDown to scroll, Esc to go back",
            palette.label(),
        )));
    }

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
    frame.render_widget(para, area);

    let cursor_x = cursor_column(area, prefix, &tui.input);
    frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
}

// Columns are counted in chars, not bytes, and clamped to the last cell.
fn cursor_column(area: Rect, prefix: &str, input: &str) -> u16 {
    let offset = prefix.chars().count() + input.chars().count();
    let cursor_x = area.x.saturating_add(offset as u16);
    if cursor_x >= area.x.saturating_add(area.width) {
        return area.x.saturating_add(area.width.saturating_sub(1));
    }
    cursor_x
}

fn draw_logs_view(state: &UiState, scroll: u16, palette: &Palette) -> Paragraph<'static> {
    let total = state.logs.len();
    let visible = 12usize;
    let start = total.saturating_sub(scroll as usize + visible);
    let mut lines = Vec::with_capacity(visible + 1);
    lines.push(Line::from(Span::styled("LOGS (scrollable)", palette.title())));
    for line in state.logs.iter().skip(start).take(visible) {
        lines.push(Line::from(line.clone()));
    }
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn search_preview(input: &str) -> String {
    match input.parse::<SearchQuery>() {
        Ok(SearchQuery::DefaultList) => "load default list".to_string(),
        Ok(SearchQuery::Name(name)) => format!("look up {name}"),
        Err(_) => "letters only".to_string(),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn parse_phase(message: &str) -> Option<(Phase, &str)> {
    let rest = message.strip_prefix("phase=")?;
    let (label, payload) = rest.split_once(';')?;
    Phase::from_label(label).map(|phase| (phase, payload.trim()))
}

fn push_event(buffer: &mut VecDeque<String>, item: String) {
    buffer.push_back(item);
    while buffer.len() > EVENTS_MAX {
        buffer.pop_front();
    }
}

fn push_log(buffer: &mut VecDeque<String>, item: String) {
    buffer.push_back(item);
    while buffer.len() > LOGS_MAX {
        buffer.pop_front();
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
