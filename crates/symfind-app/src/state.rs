// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{FormCommand, FormEvent, ResultEntry, ResultPanel, SearchForm, SearchRequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub form: SearchForm,
    pub results: ResultPanel,
    pub searches_in_flight: usize,
    pub expand_single_result: bool,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            form: SearchForm::new(),
            results: ResultPanel::default(),
            searches_in_flight: 0,
            expand_single_result: true,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Form(FormCommand),
    SearchStarted(SearchRequestId),
    SearchCompleted {
        request_id: SearchRequestId,
        entries: Vec<ResultEntry>,
        finished_at: OffsetDateTime,
    },
    SearchFailed {
        request_id: SearchRequestId,
        error: String,
    },
    SearchSettled(SearchRequestId),
    ToggleResult(usize),
    MoveResultCursor(isize),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Form(FormEvent),
    LoadingChanged(bool),
    ResultsReplaced(usize),
    ResultToggled { index: usize, expanded: bool },
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn loading(&self) -> bool {
        self.searches_in_flight > 0
    }

    pub fn submit_enabled(&self) -> bool {
        self.form.query().submit_enabled
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Form(command) => self
                .form
                .dispatch(command)
                .into_iter()
                .map(AppEvent::Form)
                .collect(),
            AppCommand::SearchStarted(request_id) => {
                let was_loading = self.loading();
                self.searches_in_flight = self.searches_in_flight.saturating_add(1);
                debug!(request = %request_id, in_flight = self.searches_in_flight, "search started");
                if was_loading {
                    Vec::new()
                } else {
                    vec![AppEvent::LoadingChanged(true)]
                }
            }
            AppCommand::SearchCompleted {
                request_id,
                entries,
                finished_at,
            } => {
                let count = entries.len();
                info!(request = %request_id, count, "search completed");
                self.results
                    .replace(entries, finished_at, self.expand_single_result);
                let label = match count {
                    0 => "no matches".to_owned(),
                    1 => "1 match".to_owned(),
                    n => format!("{n} matches"),
                };
                vec![AppEvent::ResultsReplaced(count), self.set_status(&label)]
            }
            AppCommand::SearchFailed { request_id, error } => {
                warn!(request = %request_id, %error, "search failed");
                vec![self.set_status(&format!(
                    "search failed: {error}; check [api].base_url and network access"
                ))]
            }
            AppCommand::SearchSettled(request_id) => {
                if self.searches_in_flight == 0 {
                    debug!(request = %request_id, "settle without matching start");
                    return Vec::new();
                }
                self.searches_in_flight -= 1;
                if self.loading() {
                    Vec::new()
                } else {
                    vec![AppEvent::LoadingChanged(false)]
                }
            }
            AppCommand::ToggleResult(index) => match self.results.toggle(index) {
                Some(expanded) => vec![AppEvent::ResultToggled { index, expanded }],
                None => Vec::new(),
            },
            AppCommand::MoveResultCursor(delta) => {
                self.results.move_cursor(delta);
                Vec::new()
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
