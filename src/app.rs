use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::cursor;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::time;
use unicode_width::UnicodeWidthStr;

use crate::model::{ResultItem, SearchState};
use crate::open::{OpenTarget, Opener};
use crate::session::SearchSession;
use crate::source::{HttpSource, SourceKind};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Fixed wording for one source's screen.
#[derive(Debug, Clone, Copy)]
pub struct ViewProfile {
    placeholder: &'static str,
    empty_title: &'static str,
    empty_description: &'static str,
    error_title: &'static str,
    section_title: &'static str,
    direct_search: Option<&'static str>,
}

impl ViewProfile {
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Youtube => Self {
                placeholder: "Search YouTube",
                empty_title: "Search YouTube",
                empty_description: "Start typing to see suggestions",
                error_title: "Failed to load suggestions",
                section_title: "Suggestions",
                direct_search: Some("Search YouTube"),
            },
            SourceKind::Github => Self {
                placeholder: "Search GitHub repositories",
                empty_title: "Search GitHub",
                empty_description: "Type a keyword to search repositories",
                error_title: "Failed to load repositories",
                section_title: "Repositories",
                direct_search: None,
            },
        }
    }
}

pub struct TuiContext<'a> {
    pub session: &'a SearchSession,
    pub source: &'a HttpSource,
    pub opener: &'a Opener,
    pub profile: ViewProfile,
}

pub async fn run_tui(context: TuiContext<'_>) -> Result<()> {
    let mut terminal = init_terminal()?;
    let mut app = AppState::new(context.profile);

    match run_loop(&mut terminal, &mut app, &context).await {
        Ok(()) => restore_terminal(&mut terminal),
        Err(err) => {
            let _ = restore_terminal(&mut terminal);
            Err(err)
        }
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut AppState,
    context: &TuiContext<'_>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut updates = context.session.subscribe();
    let mut spinner = time::interval(SPINNER_INTERVAL);
    app.apply_state(context.session.snapshot());

    loop {
        terminal.draw(|frame| draw_ui(frame, app))?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    break;
                };
                let Event::Key(key) = event.context("failed to read terminal event")? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match app.on_key(key) {
                    UiAction::None => {}
                    UiAction::Quit => break,
                    UiAction::QueryChanged => context.session.set_query(&app.query),
                    UiAction::Open(target) => context.opener.open(&target.url(context.source)),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("search session stopped unexpectedly");
                }
                app.apply_state(updates.borrow_and_update().clone());
            }
            _ = spinner.tick(), if app.is_busy() => app.tick_spinner(),
        }
    }

    Ok(())
}

fn draw_ui(frame: &mut Frame, app: &AppState) {
    let bottom_height = if app.show_help { 8 } else { 1 };
    let status_height = if app.visible_error().is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(status_height),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(bottom_height),
        ])
        .split(frame.area());

    if let Some(message) = app.visible_error() {
        draw_status_panel(frame, app, message, chunks[0]);
    }
    draw_results_panel(frame, app, chunks[1]);
    draw_search_bar(frame, app, chunks[2]);
    if app.show_help {
        draw_help_panel(frame, chunks[3]);
    } else {
        draw_hint_bar(frame, app, chunks[3]);
    }

    let x = chunks[2].x.saturating_add(app.cursor_column());
    frame.set_cursor_position((x, chunks[2].y));
}

fn draw_status_panel(frame: &mut Frame, app: &AppState, message: String, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            format!("✗ {} ", app.profile.error_title),
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        ),
        Span::styled(message, Style::default().fg(Color::Gray)),
    ]);
    let status = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Status")
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(status, area);
}

fn draw_results_panel(frame: &mut Frame, app: &AppState, area: Rect) {
    let border_color = Color::Rgb(88, 150, 201);

    if !app.has_search_text() {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                app.profile.empty_title,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                app.profile.empty_description,
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(70, 84, 96))),
        );
        frame.render_widget(empty, area);
        return;
    }

    let rows = app.rows();
    let title = format!("{} ({})", app.profile.section_title, app.search.items.len());
    let items: Vec<ListItem<'_>> = rows
        .iter()
        .map(|row| match row {
            Row::DirectSearch(label) => ListItem::new(Line::from(vec![
                Span::styled(
                    app.query.clone(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {label}"), Style::default().fg(Color::LightCyan)),
            ])),
            Row::Item(index) => render_result_item(&app.search.items[*index]),
        })
        .collect();

    let mut list_state = ListState::default();
    if !rows.is_empty() {
        list_state.select(Some(app.selected));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(42, 88, 116))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_result_item(item: &ResultItem) -> ListItem<'static> {
    let mut spans = vec![Span::styled(
        item.title.clone(),
        Style::default().fg(Color::White),
    )];

    if let Some(subtitle) = &item.subtitle {
        spans.push(Span::styled(
            format!(" | {subtitle}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(tag) = &item.tag {
        spans.push(Span::styled(
            format!("  {tag}"),
            Style::default().fg(Color::LightCyan),
        ));
    }
    if let Some(accessory) = &item.accessory {
        spans.push(Span::styled(
            format!("  {accessory}"),
            Style::default().fg(Color::Yellow),
        ));
    }

    ListItem::new(Line::from(spans))
}

fn draw_search_bar(frame: &mut Frame, app: &AppState, area: Rect) {
    let line = if app.query.is_empty() {
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::LightCyan)),
            Span::styled(app.profile.placeholder, Style::default().fg(Color::DarkGray)),
        ])
    } else {
        let mut spans = vec![
            Span::styled("> ", Style::default().fg(Color::LightCyan)),
            Span::styled(app.query.clone(), Style::default().fg(Color::White)),
        ];
        if app.is_busy() {
            spans.push(Span::styled(
                format!("  {}", app.spinner_frame()),
                Style::default().fg(Color::LightCyan),
            ));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn draw_hint_bar(frame: &mut Frame, app: &AppState, area: Rect) {
    let text = if app.is_busy() {
        "  Loading…  F1 for help"
    } else {
        "  F1 for help"
    };
    let hint = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Left);
    frame.render_widget(hint, area);
}

fn draw_help_panel(frame: &mut Frame, area: Rect) {
    let rows = vec![
        Line::from("  Enter          Open selected entry"),
        Line::from("  Up/Down        Move selection"),
        Line::from("  Ctrl+J/Ctrl+K  Move selection"),
        Line::from("  Left/Right     Move cursor in search input"),
        Line::from("  Home/End       Jump cursor in search input"),
        Line::from("  Backspace/Del  Edit search input"),
        Line::from("  F1             Toggle this help"),
        Line::from("  Esc            Clear search / quit"),
    ];
    let content = Paragraph::new(rows).alignment(Alignment::Left).block(
        Block::default()
            .borders(Borders::NONE)
            .style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(content, area);
}

#[derive(Debug, PartialEq, Eq)]
enum UiAction {
    None,
    Quit,
    QueryChanged,
    Open(OpenTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    DirectSearch(&'static str),
    Item(usize),
}

struct AppState {
    profile: ViewProfile,
    query: String,
    query_cursor: usize,
    search: SearchState,
    selected: usize,
    spinner_index: usize,
    show_help: bool,
}

impl AppState {
    fn new(profile: ViewProfile) -> Self {
        Self {
            profile,
            query: String::new(),
            query_cursor: 0,
            search: SearchState::idle(),
            selected: 0,
            spinner_index: 0,
            show_help: false,
        }
    }

    fn has_search_text(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Spinner only shows for non-blank input, even if a request is still draining.
    fn is_busy(&self) -> bool {
        self.search.is_loading && self.has_search_text()
    }

    fn visible_error(&self) -> Option<String> {
        if !self.has_search_text() {
            return None;
        }
        self.search.error.as_ref().map(ToString::to_string)
    }

    fn rows(&self) -> Vec<Row> {
        if !self.has_search_text() {
            return Vec::new();
        }

        let mut rows = Vec::with_capacity(self.search.items.len() + 1);
        if let Some(label) = self.profile.direct_search {
            rows.push(Row::DirectSearch(label));
        }
        rows.extend((0..self.search.items.len()).map(Row::Item));
        rows
    }

    fn selected_item(&self) -> Option<&ResultItem> {
        match self.rows().get(self.selected) {
            Some(Row::Item(index)) => self.search.items.get(*index),
            _ => None,
        }
    }

    /// Swaps in a new snapshot, keeping the cursor on the same result when it survives.
    fn apply_state(&mut self, state: SearchState) {
        let selected_id = self.selected_item().map(|item| item.id.clone());
        if !state.is_loading {
            self.spinner_index = 0;
        }
        self.search = state;

        let rows = self.rows();
        if let Some(id) = selected_id {
            let same_item = rows.iter().position(
                |row| matches!(row, Row::Item(index) if self.search.items[*index].id == id),
            );
            if let Some(position) = same_item {
                self.selected = position;
                return;
            }
        }
        if self.selected >= rows.len() {
            self.selected = rows.len().saturating_sub(1);
        }
    }

    /// Terminal column of the input cursor, past the "> " prompt.
    fn cursor_column(&self) -> u16 {
        let before_cursor = &self.query[..byte_index_for_char(&self.query, self.query_cursor)];
        u16::try_from(before_cursor.width())
            .unwrap_or(u16::MAX)
            .saturating_add(2)
    }

    fn tick_spinner(&mut self) {
        self.spinner_index = (self.spinner_index + 1) % SPINNER_FRAMES.len();
    }

    fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_index % SPINNER_FRAMES.len()]
    }

    fn on_key(&mut self, key: KeyEvent) -> UiAction {
        if self.show_help {
            match key.code {
                KeyCode::Esc | KeyCode::F(1) => {
                    self.show_help = false;
                    return UiAction::None;
                }
                _ => {
                    self.show_help = false;
                }
            }
        }

        match key.code {
            KeyCode::F(1) => {
                self.show_help = true;
                UiAction::None
            }
            KeyCode::Esc => {
                if self.query.is_empty() {
                    UiAction::Quit
                } else {
                    self.query.clear();
                    self.query_cursor = 0;
                    self.selected = 0;
                    UiAction::QueryChanged
                }
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Left => {
                self.query_cursor = self.query_cursor.saturating_sub(1);
                UiAction::None
            }
            KeyCode::Right => {
                if self.query_cursor < self.query.chars().count() {
                    self.query_cursor += 1;
                }
                UiAction::None
            }
            KeyCode::Home => {
                self.query_cursor = 0;
                UiAction::None
            }
            KeyCode::End => {
                self.query_cursor = self.query.chars().count();
                UiAction::None
            }
            KeyCode::Up => {
                self.move_selection(-1);
                UiAction::None
            }
            KeyCode::Down => {
                self.move_selection(1);
                UiAction::None
            }
            KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(1);
                UiAction::None
            }
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-1);
                UiAction::None
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => UiAction::Quit,
            KeyCode::Backspace => {
                if self.query_cursor > 0 && remove_char_at(&mut self.query, self.query_cursor - 1) {
                    self.query_cursor -= 1;
                    self.selected = 0;
                    return UiAction::QueryChanged;
                }
                UiAction::None
            }
            KeyCode::Delete => {
                if remove_char_at(&mut self.query, self.query_cursor) {
                    self.selected = 0;
                    return UiAction::QueryChanged;
                }
                UiAction::None
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                insert_char_at(&mut self.query, self.query_cursor, ch);
                self.query_cursor += 1;
                self.selected = 0;
                UiAction::QueryChanged
            }
            _ => UiAction::None,
        }
    }

    fn open_selected(&self) -> UiAction {
        match self.rows().get(self.selected) {
            Some(Row::DirectSearch(_)) => UiAction::Open(OpenTarget::SearchTerm(self.query.clone())),
            Some(Row::Item(index)) => UiAction::Open(OpenTarget::Item(self.search.items[*index].clone())),
            None => UiAction::None,
        }
    }

    fn move_selection(&mut self, direction: isize) {
        let len = self.rows().len();
        if len == 0 {
            self.selected = 0;
            return;
        }

        let next = (self.selected as isize + direction).rem_euclid(len as isize);
        self.selected = next as usize;
    }
}

fn insert_char_at(value: &mut String, char_index: usize, ch: char) {
    let byte_index = byte_index_for_char(value, char_index);
    value.insert(byte_index, ch);
}

fn remove_char_at(value: &mut String, char_index: usize) -> bool {
    let start = byte_index_for_char(value, char_index);
    if start >= value.len() {
        return false;
    }
    let end = byte_index_for_char(value, char_index + 1);
    value.replace_range(start..end, "");
    true
}

fn byte_index_for_char(value: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    value
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}
