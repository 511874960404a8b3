// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::RowId;

/// Accepts `^(0x)?[0-9a-fA-F]*$`. The prefix is lowercase only and the
/// empty string passes.
pub fn validate_address(address: &str) -> bool {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    digits.bytes().all(|byte| byte.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
    pub symbol: String,
    pub address: String,
    pub valid: bool,
}

impl Default for RowState {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            address: String::new(),
            valid: true,
        }
    }
}

impl RowState {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            symbol: symbol.into(),
            valid: validate_address(&address),
            address,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty() && self.address.is_empty()
    }

    pub fn contributes(&self) -> bool {
        self.valid && !self.symbol.is_empty() && !self.address.is_empty()
    }
}

/// Read-only projection of one form row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    pub symbol: String,
    pub address: String,
    pub valid: bool,
}

impl Row {
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty() && self.address.is_empty()
    }
}

/// Per-row field state keyed by row id. Rows that were never edited have no
/// entry and read as empty and valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    entries: BTreeMap<RowId, RowState>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: RowId) -> Option<&RowState> {
        self.entries.get(&id)
    }

    pub fn record(&mut self, id: RowId, state: RowState) {
        self.entries.insert(id, state);
    }

    pub fn set_symbol(&mut self, id: RowId, symbol: &str) {
        let entry = self.entries.entry(id).or_default();
        entry.symbol = symbol.to_owned();
    }

    pub fn set_address(&mut self, id: RowId, address: &str) {
        let entry = self.entries.entry(id).or_default();
        entry.address = address.to_owned();
        entry.valid = validate_address(address);
    }

    pub fn forget(&mut self, id: RowId) -> Option<RowState> {
        self.entries.remove(&id)
    }

    pub fn is_empty_row(&self, id: RowId) -> bool {
        self.entries.get(&id).is_none_or(RowState::is_empty)
    }

    /// Drops entries for rows that are no longer displayed.
    pub fn retain_rows(&mut self, rows: &[RowId]) {
        self.entries.retain(|id, _| rows.contains(id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn project(&self, id: RowId) -> Row {
        let state = self.entries.get(&id).cloned().unwrap_or_default();
        Row {
            id,
            symbol: state.symbol,
            address: state.address,
            valid: state.valid,
        }
    }
}
