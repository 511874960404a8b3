// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::{Query, Row, RowId, RowIdAllocator, RowStore, build_query};

/// Settles the row list to a fixed point of two rules:
///
/// - append a fresh row when no row is empty
/// - drop the tail row while it and the row before it are both empty
///
/// The rules never fire together (one needs zero empty rows, the other at
/// least two), so a settled list passes through unchanged and no id is drawn.
pub fn reconcile(rows: &[RowId], store: &RowStore, ids: &mut RowIdAllocator) -> Vec<RowId> {
    let mut settled = rows.to_vec();
    loop {
        let mut changed = false;

        if !settled.iter().any(|id| store.is_empty_row(*id)) {
            settled.push(ids.allocate());
            changed = true;
        }

        while settled.len() >= 2
            && store.is_empty_row(settled[settled.len() - 1])
            && store.is_empty_row(settled[settled.len() - 2])
        {
            settled.pop();
            changed = true;
        }

        if !changed {
            return settled;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Symbol,
    Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    Edit {
        id: RowId,
        field: RowField,
        value: String,
    },
    Remove(RowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    RowEdited(RowId),
    RowRemoved(RowId),
    RowAppended(RowId),
    RowTrimmed(RowId),
    StaleRow(RowId),
}

/// Owns the displayed row order and the per-row field state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    rows: Vec<RowId>,
    store: RowStore,
    ids: RowIdAllocator,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchForm {
    pub fn new() -> Self {
        let mut form = Self {
            rows: Vec::new(),
            store: RowStore::new(),
            ids: RowIdAllocator::new(),
        };
        form.settle();
        form
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.iter().map(|id| self.store.project(*id)).collect()
    }

    pub fn row(&self, id: RowId) -> Option<Row> {
        self.contains(id).then(|| self.store.project(id))
    }

    // Never zero: settling always leaves a blank row.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains(&id)
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| *row == id)
    }

    /// The trailing row; after settling it is always a blank slot or the
    /// row the user is currently filling.
    pub fn last_row(&self) -> Option<RowId> {
        self.rows.last().copied()
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn query(&self) -> Query {
        build_query(&self.rows, &self.store)
    }

    pub fn dispatch(&mut self, command: FormCommand) -> Vec<FormEvent> {
        match command {
            FormCommand::Edit { id, field, value } => self.edit(id, field, &value),
            FormCommand::Remove(id) => self.remove(id),
        }
    }

    pub fn edit(&mut self, id: RowId, field: RowField, value: &str) -> Vec<FormEvent> {
        if !self.contains(id) {
            debug!(row = %id, "edit for row that is no longer displayed");
            return vec![FormEvent::StaleRow(id)];
        }

        match field {
            RowField::Symbol => self.store.set_symbol(id, value),
            RowField::Address => self.store.set_address(id, value),
        }

        let mut events = vec![FormEvent::RowEdited(id)];
        events.extend(self.settle());
        events
    }

    pub fn remove(&mut self, id: RowId) -> Vec<FormEvent> {
        let Some(index) = self.position(id) else {
            debug!(row = %id, "remove for unknown row ignored");
            return vec![FormEvent::StaleRow(id)];
        };

        self.rows.remove(index);
        self.store.forget(id);

        let mut events = vec![FormEvent::RowRemoved(id)];
        events.extend(self.settle());
        events
    }

    /// Applies the reconciler and reports which rows it added or dropped.
    pub fn settle(&mut self) -> Vec<FormEvent> {
        let settled = reconcile(&self.rows, &self.store, &mut self.ids);
        if settled == self.rows {
            return Vec::new();
        }

        let mut events = Vec::new();
        for id in &self.rows {
            if !settled.contains(id) {
                events.push(FormEvent::RowTrimmed(*id));
            }
        }
        for id in &settled {
            if !self.rows.contains(id) {
                events.push(FormEvent::RowAppended(*id));
            }
        }

        self.rows = settled;
        self.store.retain_rows(&self.rows);
        debug!(rows = self.rows.len(), "form settled");
        events
    }
}
