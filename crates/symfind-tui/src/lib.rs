// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use symfind_app::{
    AppCommand, AppEvent, AppState, FindRequest, FormCommand, ResultEntry, RowField, RowId,
    SearchRequestId,
};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::debug;

const SYMBOL_WIDTH: usize = 24;
const ADDRESS_WIDTH: usize = 18;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    Completed {
        request_id: SearchRequestId,
        entries: Vec<ResultEntry>,
    },
    Failed {
        request_id: SearchRequestId,
        error: String,
    },
    Settled {
        request_id: SearchRequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Search(SearchEvent),
}

/// Held for the lifetime of one search. Dropping it always reports the
/// search as settled, so the loading indicator clears on every path,
/// including a worker that panics or never reports an outcome.
#[derive(Debug)]
pub struct SearchGuard {
    request_id: SearchRequestId,
    tx: Sender<InternalEvent>,
}

impl SearchGuard {
    pub fn new(request_id: SearchRequestId, tx: Sender<InternalEvent>) -> Self {
        Self { request_id, tx }
    }

    pub fn request_id(&self) -> SearchRequestId {
        self.request_id
    }

    pub fn finish(self, outcome: Result<Vec<ResultEntry>>) {
        let request_id = self.request_id;
        let event = match outcome {
            Ok(entries) => SearchEvent::Completed {
                request_id,
                entries,
            },
            Err(error) => SearchEvent::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        };
        let _ = self.tx.send(InternalEvent::Search(event));
    }
}

impl Drop for SearchGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(InternalEvent::Search(SearchEvent::Settled {
            request_id: self.request_id,
        }));
    }
}

pub trait AppRuntime {
    fn search(&mut self, request: &FindRequest) -> Result<Vec<ResultEntry>>;

    /// Runs inline unless a runtime moves the guard onto a worker.
    fn spawn_search(&mut self, request: FindRequest, guard: SearchGuard) -> Result<()> {
        guard.finish(self.search(&request));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Field { row: RowId, field: RowField },
    FindButton,
    Results,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    focus: Focus,
    help_visible: bool,
    next_request_id: u64,
    status_token: u64,
}

impl ViewData {
    fn new(state: &AppState) -> Self {
        let focus = state
            .form
            .row_ids()
            .first()
            .map_or(Focus::FindButton, |row| Focus::Field {
                row: *row,
                field: RowField::Symbol,
            });
        Self {
            focus,
            help_visible: false,
            next_request_id: 0,
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(state);
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Search(event) => handle_search_event(state, view_data, tx, event),
        }
    }
}

fn handle_search_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: SearchEvent,
) {
    // Responses are applied in arrival order; the last one to land wins.
    let command = match event {
        SearchEvent::Completed {
            request_id,
            entries,
        } => AppCommand::SearchCompleted {
            request_id,
            entries,
            finished_at: OffsetDateTime::now_utc(),
        },
        SearchEvent::Failed { request_id, error } => {
            AppCommand::SearchFailed { request_id, error }
        }
        SearchEvent::Settled { request_id } => AppCommand::SearchSettled(request_id),
    };
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        bump_status_token(view_data, tx);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    bump_status_token(view_data, internal_tx);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }

    if key.code == KeyCode::F(1) {
        view_data.help_visible = !view_data.help_visible;
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if ctrl && key.code == KeyCode::Char('s') {
        submit_search(state, runtime, view_data, internal_tx);
        return false;
    }

    match key.code {
        KeyCode::Tab => {
            move_focus(state, view_data, 1);
            return false;
        }
        KeyCode::BackTab => {
            move_focus(state, view_data, -1);
            return false;
        }
        _ => {}
    }

    match view_data.focus {
        Focus::Field { .. } => handle_field_key(state, runtime, view_data, internal_tx, key),
        Focus::FindButton => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                submit_search(state, runtime, view_data, internal_tx);
            }
            KeyCode::Up => move_focus(state, view_data, -1),
            KeyCode::Down => move_focus(state, view_data, 1),
            KeyCode::Char('?') => view_data.help_visible = true,
            _ => {}
        },
        Focus::Results => handle_results_key(state, view_data, key),
    }
    false
}

fn handle_field_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Enter => submit_search(state, runtime, view_data, internal_tx),
        KeyCode::Up => move_row_focus(state, view_data, -1),
        KeyCode::Down => move_row_focus(state, view_data, 1),
        KeyCode::Backspace => edit_focused_field(state, view_data, |value| {
            value.pop();
        }),
        KeyCode::Delete => remove_focused_row(state, view_data, internal_tx),
        KeyCode::Char('d') if ctrl => remove_focused_row(state, view_data, internal_tx),
        KeyCode::Char('u') if ctrl => edit_focused_field(state, view_data, String::clear),
        KeyCode::Char(c) if !ctrl && !alt => {
            edit_focused_field(state, view_data, |value| value.push(c));
        }
        _ => {}
    }
}

fn handle_results_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.dispatch(AppCommand::MoveResultCursor(-1));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.dispatch(AppCommand::MoveResultCursor(1));
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let cursor = state.results.cursor();
            state.dispatch(AppCommand::ToggleResult(cursor));
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
}

fn focus_order(state: &AppState) -> Vec<Focus> {
    let mut order = Vec::with_capacity(state.form.len() * 2 + 2);
    for row in state.form.row_ids() {
        order.push(Focus::Field {
            row: *row,
            field: RowField::Symbol,
        });
        order.push(Focus::Field {
            row: *row,
            field: RowField::Address,
        });
    }
    order.push(Focus::FindButton);
    order.push(Focus::Results);
    order
}

fn move_focus(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let order = focus_order(state);
    let current = order
        .iter()
        .position(|focus| *focus == view_data.focus)
        .unwrap_or(0) as isize;
    let len = order.len() as isize;
    let next = (current + delta).rem_euclid(len) as usize;
    view_data.focus = order[next];
}

fn move_row_focus(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let Focus::Field { row, field } = view_data.focus else {
        return;
    };
    let Some(index) = state.form.position(row) else {
        return;
    };
    let target = index as isize + delta;
    if target < 0 {
        return;
    }
    view_data.focus = match state.form.row_ids().get(target as usize) {
        Some(next) => Focus::Field { row: *next, field },
        None => Focus::FindButton,
    };
}

/// Keeps field focus on a displayed row after the reconciler drops the
/// focused one.
fn sync_focus(state: &AppState, view_data: &mut ViewData, previous_index: usize) {
    let Focus::Field { row, field } = view_data.focus else {
        return;
    };
    if state.form.contains(row) {
        return;
    }
    let rows = state.form.row_ids();
    let index = previous_index.min(rows.len().saturating_sub(1));
    view_data.focus = match rows.get(index) {
        Some(next) => Focus::Field { row: *next, field },
        None => Focus::FindButton,
    };
}

fn edit_focused_field(
    state: &mut AppState,
    view_data: &mut ViewData,
    edit: impl FnOnce(&mut String),
) {
    let Focus::Field { row, field } = view_data.focus else {
        return;
    };
    let Some(current) = state.form.row(row) else {
        return;
    };
    let mut value = match field {
        RowField::Symbol => current.symbol,
        RowField::Address => current.address,
    };
    let before = value.clone();
    edit(&mut value);
    if value == before {
        return;
    }

    let index = state.form.position(row).unwrap_or(0);
    state.dispatch(AppCommand::Form(FormCommand::Edit {
        id: row,
        field,
        value,
    }));
    sync_focus(state, view_data, index);
}

fn remove_focused_row(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Focus::Field { row, .. } = view_data.focus else {
        return;
    };
    let index = state.form.position(row).unwrap_or(0);
    state.dispatch(AppCommand::Form(FormCommand::Remove(row)));
    sync_focus(state, view_data, index);
    emit_status(state, view_data, internal_tx, "row removed");
}

fn next_search_request_id(view_data: &mut ViewData) -> SearchRequestId {
    view_data.next_request_id = view_data.next_request_id.saturating_add(1);
    SearchRequestId::new(view_data.next_request_id)
}

fn submit_search<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let query = state.form.query();
    if !query.submit_enabled {
        emit_status(
            state,
            view_data,
            internal_tx,
            "find disabled -- fix invalid addresses and pair at least one symbol with an address",
        );
        return;
    }

    let request_id = next_search_request_id(view_data);
    debug!(request = %request_id, symbols = query.mapping.len(), "submitting search");
    state.dispatch(AppCommand::SearchStarted(request_id));

    let guard = SearchGuard::new(request_id, internal_tx.clone());
    if let Err(error) = runtime.spawn_search(query.to_request(), guard) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("search failed to start: {error}"),
        );
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(query_preview_text(state))
        .block(Block::default().title("symfind").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);

    let form = Paragraph::new(form_lines(state, view_data))
        .block(Block::default().title("search").borders(Borders::ALL));
    frame.render_widget(form, body[0]);

    let results = Paragraph::new(result_lines(state, view_data))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(results_title(state))
                .borders(Borders::ALL),
        );
    frame.render_widget(results, body[1]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn query_preview_text(state: &AppState) -> String {
    let query = state.form.query();
    if query.mapping.is_empty() {
        return "query: (empty)".to_owned();
    }
    let pairs = query
        .mapping
        .iter()
        .map(|(symbol, address)| format!("{symbol}={address}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("query: {pairs}")
}

fn form_lines(state: &AppState, view_data: &ViewData) -> Vec<Line<'static>> {
    let invalid = Style::default().fg(Color::Red);
    let mut lines = Vec::with_capacity(state.form.len() + 2);

    for (index, row) in state.form.rows().into_iter().enumerate() {
        let focused_field = match view_data.focus {
            Focus::Field { row: id, field } if id == row.id => Some(field),
            _ => None,
        };
        let marker = if focused_field.is_some() { "›" } else { " " };
        let address_style = if row.valid {
            Style::default()
        } else {
            invalid
        };

        let mut spans = vec![
            Span::raw(format!("{marker}{:>3}. ", index + 1)),
            field_span(
                &row.symbol,
                "symbol",
                SYMBOL_WIDTH,
                focused_field == Some(RowField::Symbol),
                Style::default(),
            ),
            Span::raw(" "),
            field_span(
                &row.address,
                "address",
                ADDRESS_WIDTH,
                focused_field == Some(RowField::Address),
                address_style,
            ),
        ];
        if !row.valid {
            spans.push(Span::styled(" invalid address", invalid));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(find_button_line(state, view_data));
    lines
}

fn field_span(
    value: &str,
    placeholder: &str,
    width: usize,
    focused: bool,
    style: Style,
) -> Span<'static> {
    let (text, style) = if value.is_empty() && !focused {
        (
            format!("[{placeholder:<width$}]"),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (format!("[{value:<width$}]"), style)
    };
    let style = if focused {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    };
    Span::styled(text, style)
}

fn find_button_line(state: &AppState, view_data: &ViewData) -> Line<'static> {
    let mut style = if state.submit_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    if view_data.focus == Focus::FindButton {
        style = style.add_modifier(Modifier::REVERSED);
    }

    let mut spans = vec![Span::raw("      "), Span::styled("[ Find ]", style)];
    if state.loading() {
        spans.push(Span::styled(
            " searching...",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn results_title(state: &AppState) -> String {
    let Some(summary) = state.results.summary() else {
        return "results".to_owned();
    };
    let at = summary
        .finished_at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".to_owned());
    format!("results ({}) {at} UTC", summary.count)
}

fn result_lines(state: &AppState, view_data: &ViewData) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if state.loading() {
        lines.push(Line::styled(
            "searching...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let Some(items) = state.results.items() else {
        if !state.loading() {
            lines.push(Line::raw("no search yet -- fill a row and press enter"));
        }
        return lines;
    };
    if items.is_empty() {
        lines.push(Line::raw("no matches"));
        return lines;
    }

    let results_focused = view_data.focus == Focus::Results;
    for (index, item) in items.iter().enumerate() {
        let arrow = if item.expanded { "▾" } else { "▸" };
        let mut style = Style::default().fg(Color::Cyan);
        if results_focused && index == state.results.cursor() {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::styled(format!("{arrow} {}", item.entry.id), style));
        if item.expanded {
            lines.extend(entry_detail_lines(&item.entry).into_iter().map(Line::raw));
        }
    }
    lines
}

fn entry_detail_lines(entry: &ResultEntry) -> Vec<String> {
    let mut out = vec![
        format!("    download  {}", entry.download_url),
        format!("    buildid   {}", entry.buildid.as_deref().unwrap_or("-")),
        format!("    md5       {}", entry.md5.as_deref().unwrap_or("-")),
    ];
    if let Some(sha1) = &entry.sha1 {
        out.push(format!("    sha1      {sha1}"));
    }
    if let Some(sha256) = &entry.sha256 {
        out.push(format!("    sha256    {sha256}"));
    }
    for (name, address) in &entry.symbols {
        out.push(format!("    {name:<24} {address}"));
    }
    out
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let hint = match view_data.focus {
        Focus::Field { .. } => {
            "type to edit | tab/shift+tab field | enter find | ctrl+d remove row | ctrl+u clear"
        }
        Focus::FindButton => "enter find | tab/shift+tab field",
        Focus::Results => "j/k move | enter/space expand | tab/shift+tab field",
    };
    match &state.status_line {
        Some(status) => format!("{status} | {hint} | F1 help | ctrl+q quit"),
        None => format!("{hint} | F1 help | ctrl+q quit"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ctrl+s find | F1 help | tab/shift+tab next/prev field\n\
fields: type to edit | backspace delete | ctrl+u clear | up/down row | enter find\n\
fields: ctrl+d or delete remove row (a blank row is always kept at the end)\n\
address: hex digits with optional 0x prefix, e.g. 0x7f4a0 or 4a0\n\
results: j/k or up/down move | enter/space expand or collapse\n\
help: esc or ? close"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, Focus, InternalEvent, SearchEvent, SearchGuard, ViewData, entry_detail_lines,
        form_lines, handle_key_event, process_internal_events, query_preview_text, result_lines,
        results_title, status_text,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::text::Line;
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, Receiver, Sender};
    use symfind_app::{AppState, FindRequest, ResultEntry, RowField, RowId, SearchRequestId};
    use symfind_testkit::{libc_entries, sample_entry};
    use time::OffsetDateTime;

    #[derive(Debug, Default)]
    struct TestRuntime {
        outcomes: VecDeque<std::result::Result<Vec<ResultEntry>, String>>,
        requests: Vec<FindRequest>,
        refuse_spawn: bool,
    }

    impl TestRuntime {
        fn answering(entries: Vec<ResultEntry>) -> Self {
            Self {
                outcomes: VecDeque::from([Ok(entries)]),
                ..Self::default()
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn search(&mut self, request: &FindRequest) -> Result<Vec<ResultEntry>> {
            self.requests.push(request.clone());
            match self.outcomes.pop_front() {
                Some(Ok(entries)) => Ok(entries),
                Some(Err(error)) => Err(anyhow!(error)),
                None => Err(anyhow!("no canned outcome")),
            }
        }

        fn spawn_search(&mut self, request: FindRequest, guard: SearchGuard) -> Result<()> {
            if self.refuse_spawn {
                drop(guard);
                return Err(anyhow!("worker pool exhausted"));
            }
            guard.finish(self.search(&request));
            Ok(())
        }
    }

    struct Harness {
        state: AppState,
        view: ViewData,
        runtime: TestRuntime,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let state = AppState::default();
            let view = ViewData::new(&state);
            let (tx, rx) = mpsc::channel();
            Self {
                state,
                view,
                runtime,
                tx,
                rx,
            }
        }

        fn key(&mut self, code: KeyCode) -> bool {
            self.key_with(code, KeyModifiers::NONE)
        }

        fn key_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view,
                &self.tx,
                KeyEvent::new(code, modifiers),
            )
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.key(KeyCode::Char(c));
            }
        }

        fn pump(&mut self) {
            process_internal_events(&mut self.state, &mut self.view, &self.tx, &self.rx);
        }
    }

    fn text_of(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn typing_a_pair_and_pressing_enter_searches() {
        let mut h = Harness::new(TestRuntime::answering(libc_entries()));
        h.type_text("puts");
        h.key(KeyCode::Tab);
        h.type_text("0x9c0");
        assert_eq!(h.state.form.len(), 2, "typing opens a fresh blank row");

        h.key(KeyCode::Enter);
        assert!(h.state.loading(), "loading is set before the response lands");
        assert_eq!(h.runtime.requests.len(), 1);
        assert_eq!(
            h.runtime.requests[0].symbols.get("puts").map(String::as_str),
            Some("0x9c0")
        );

        h.pump();
        assert!(!h.state.loading());
        assert_eq!(h.state.results.len(), 2);
        assert_eq!(h.state.status_line.as_deref(), Some("2 matches"));
    }

    #[test]
    fn invalid_address_blocks_find() {
        let mut h = Harness::new(TestRuntime::default());
        h.type_text("puts");
        h.key(KeyCode::Tab);
        h.type_text("0xzz");

        h.key_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(h.runtime.requests.is_empty());
        assert!(!h.state.loading());
        assert!(
            h.state
                .status_line
                .as_deref()
                .is_some_and(|line| line.starts_with("find disabled"))
        );

        let rendered = text_of(&form_lines(&h.state, &h.view));
        assert!(rendered.contains("invalid address"));
    }

    #[test]
    fn failed_search_keeps_old_results_and_clears_loading() {
        let mut runtime = TestRuntime::answering(libc_entries());
        runtime.outcomes.push_back(Err("connection reset".to_owned()));
        let mut h = Harness::new(runtime);
        h.type_text("puts");
        h.key(KeyCode::Tab);
        h.type_text("9c0");

        h.key(KeyCode::Enter);
        h.pump();
        h.key(KeyCode::Enter);
        h.pump();

        assert!(!h.state.loading());
        assert_eq!(h.state.results.len(), 2);
        assert!(
            h.state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("connection reset"))
        );
    }

    #[test]
    fn spawn_failure_still_settles_loading() {
        let mut h = Harness::new(TestRuntime {
            refuse_spawn: true,
            ..TestRuntime::default()
        });
        h.type_text("read");
        h.key(KeyCode::Tab);
        h.type_text("250");
        h.key(KeyCode::Enter);
        assert!(h.state.loading());

        h.pump();
        assert!(!h.state.loading());
        assert!(
            h.state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("worker pool exhausted"))
        );
    }

    #[test]
    fn guard_drop_reports_settled_once() {
        let (tx, rx) = mpsc::channel();
        let guard = SearchGuard::new(SearchRequestId::new(4), tx);
        guard.finish(Ok(Vec::new()));

        let events = rx.try_iter().collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                InternalEvent::Search(SearchEvent::Completed {
                    request_id: SearchRequestId::new(4),
                    entries: Vec::new(),
                }),
                InternalEvent::Search(SearchEvent::Settled {
                    request_id: SearchRequestId::new(4),
                }),
            ]
        );
    }

    #[test]
    fn ctrl_d_removes_row_and_keeps_focus_on_a_live_row() {
        let mut h = Harness::new(TestRuntime::default());
        h.type_text("puts");
        h.key(KeyCode::Down);
        h.type_text("read");
        assert_eq!(h.state.form.len(), 3);

        let second = h.state.form.row_ids()[1];
        assert_eq!(
            h.view.focus,
            Focus::Field {
                row: second,
                field: RowField::Symbol
            }
        );

        h.key_with(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(h.state.form.len(), 2);
        let Focus::Field { row, .. } = h.view.focus else {
            panic!("focus should stay on a field");
        };
        assert!(h.state.form.contains(row));
    }

    #[test]
    fn clearing_a_field_that_gets_trimmed_moves_focus() {
        let mut h = Harness::new(TestRuntime::default());
        h.type_text("a");
        h.key(KeyCode::Down);
        h.type_text("b");
        h.key(KeyCode::Up);
        h.key(KeyCode::Backspace);
        h.key(KeyCode::Down);
        assert_eq!(h.state.form.len(), 3);

        // clearing the middle row leaves three blank rows, two get trimmed
        h.key(KeyCode::Backspace);
        assert_eq!(h.state.form.row_ids(), &[RowId::new(0)]);
        assert_eq!(
            h.view.focus,
            Focus::Field {
                row: RowId::new(0),
                field: RowField::Symbol
            }
        );
    }

    #[test]
    fn tab_cycles_fields_button_and_results() {
        let mut h = Harness::new(TestRuntime::default());
        h.key(KeyCode::Tab);
        assert_eq!(
            h.view.focus,
            Focus::Field {
                row: RowId::new(0),
                field: RowField::Address
            }
        );
        h.key(KeyCode::Tab);
        assert_eq!(h.view.focus, Focus::FindButton);
        h.key(KeyCode::Tab);
        assert_eq!(h.view.focus, Focus::Results);
        h.key(KeyCode::Tab);
        assert_eq!(
            h.view.focus,
            Focus::Field {
                row: RowId::new(0),
                field: RowField::Symbol
            }
        );
        h.key(KeyCode::BackTab);
        assert_eq!(h.view.focus, Focus::Results);
    }

    #[test]
    fn results_focus_moves_cursor_and_toggles() {
        let mut h = Harness::new(TestRuntime::answering(libc_entries()));
        h.type_text("puts");
        h.key(KeyCode::Tab);
        h.type_text("9c0");
        h.key(KeyCode::Enter);
        h.pump();

        h.view.focus = Focus::Results;
        h.key(KeyCode::Char('j'));
        assert_eq!(h.state.results.cursor(), 1);
        h.key(KeyCode::Enter);

        let items = h.state.results.items().expect("results present");
        assert!(!items[0].expanded);
        assert!(items[1].expanded);

        let rendered = text_of(&result_lines(&h.state, &h.view));
        assert!(rendered.contains("▸ libc6_2.27-3ubuntu1_amd64"));
        assert!(rendered.contains("▾ libc6_2.27-3ubuntu1.2_amd64"));
        assert!(rendered.contains("download  https://libc.rip/download/"));
    }

    #[test]
    fn editing_stays_open_while_search_in_flight() {
        let mut h = Harness::new(TestRuntime::answering(libc_entries()));
        h.type_text("puts");
        h.key(KeyCode::Tab);
        h.type_text("9c0");
        h.key(KeyCode::Enter);
        assert!(h.state.loading());

        h.key(KeyCode::Down);
        h.type_text("system");
        assert_eq!(h.state.form.len(), 3);
        h.pump();
        assert_eq!(h.state.form.len(), 3);
    }

    #[test]
    fn help_toggles_with_f1_and_swallows_keys() {
        let mut h = Harness::new(TestRuntime::default());
        h.key(KeyCode::F(1));
        assert!(h.view.help_visible);
        h.type_text("x");
        assert!(h.state.form.rows()[0].symbol.is_empty());
        h.key(KeyCode::Esc);
        assert!(!h.view.help_visible);
        assert!(h.key_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn query_preview_shows_last_write_for_duplicates() {
        let mut h = Harness::new(TestRuntime::default());
        h.type_text("f");
        h.key(KeyCode::Tab);
        h.type_text("0x1");
        h.key(KeyCode::Tab);
        h.type_text("f");
        h.key(KeyCode::Tab);
        h.type_text("0x2");
        assert_eq!(query_preview_text(&h.state), "query: f=0x2");
    }

    #[test]
    fn results_render_placeholder_and_empty_states() {
        let mut state = AppState::default();
        let view = ViewData::new(&state);
        assert!(text_of(&result_lines(&state, &view)).contains("no search yet"));
        assert_eq!(results_title(&state), "results");

        state.dispatch(symfind_app::AppCommand::SearchCompleted {
            request_id: SearchRequestId::new(1),
            entries: Vec::new(),
            finished_at: OffsetDateTime::UNIX_EPOCH,
        });
        assert_eq!(text_of(&result_lines(&state, &view)), "no matches");
        assert_eq!(results_title(&state), "results (0) 00:00:00 UTC");
    }

    #[test]
    fn detail_lines_list_hashes_and_symbols() {
        let mut entry = sample_entry("libc6_2.31", &[("puts", "0x875a0")]);
        entry.buildid = None;
        entry.sha1 = Some("da39a3ee".to_owned());

        let lines = entry_detail_lines(&entry);
        assert!(lines.iter().any(|line| line.trim() == "buildid   -"));
        assert!(lines.iter().any(|line| line.contains("sha1      da39a3ee")));
        assert!(!lines.iter().any(|line| line.contains("sha256")));
        assert!(
            lines
                .iter()
                .any(|line| line.contains("puts") && line.ends_with("0x875a0"))
        );
    }

    #[test]
    fn status_line_prefixes_hints() {
        let mut state = AppState::default();
        let view = ViewData::new(&state);
        assert!(status_text(&state, &view).starts_with("type to edit"));

        state.status_line = Some("1 match".to_owned());
        assert!(status_text(&state, &view).starts_with("1 match | type to edit"));
    }
}
