// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One candidate library returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: String,
    #[serde(default)]
    pub buildid: Option<String>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
    #[serde(default)]
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub entry: ResultEntry,
    pub expanded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    pub count: usize,
    pub finished_at: OffsetDateTime,
}

/// Display state for the latest search response. Expansion is per entry and
/// has no bearing on the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPanel {
    items: Option<Vec<ResultItem>>,
    cursor: usize,
    summary: Option<SearchSummary>,
}

impl ResultPanel {
    pub fn replace(
        &mut self,
        entries: Vec<ResultEntry>,
        finished_at: OffsetDateTime,
        expand_single: bool,
    ) {
        let expand = expand_single && entries.len() == 1;
        self.summary = Some(SearchSummary {
            count: entries.len(),
            finished_at,
        });
        self.items = Some(
            entries
                .into_iter()
                .map(|entry| ResultItem {
                    entry,
                    expanded: expand,
                })
                .collect(),
        );
        self.cursor = 0;
    }

    /// `None` until the first response arrives.
    pub fn items(&self) -> Option<&[ResultItem]> {
        self.items.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> Option<SearchSummary> {
        self.summary
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let max = (len - 1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    /// Returns the new expanded flag, or `None` when `index` is out of range.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let item = self.items.as_mut()?.get_mut(index)?;
        item.expanded = !item.expanded;
        Some(item.expanded)
    }
}
