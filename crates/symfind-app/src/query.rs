// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{FindRequest, RowId, RowStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub mapping: BTreeMap<String, String>,
    pub submit_enabled: bool,
}

impl Query {
    pub fn to_request(&self) -> FindRequest {
        FindRequest::from_symbols(self.mapping.clone())
    }
}

/// Projects the displayed rows into a symbol -> address mapping.
///
/// Rows are visited in display order, so a later row wins when two rows name
/// the same symbol. Store entries for rows outside `rows` are ignored.
/// Submission is blocked by any invalid recorded row, even one that would not
/// contribute.
pub fn build_query(rows: &[RowId], store: &RowStore) -> Query {
    let mut mapping = BTreeMap::new();
    let mut any_invalid = false;

    for id in rows {
        let Some(state) = store.get(*id) else {
            continue;
        };
        if !state.valid {
            any_invalid = true;
            continue;
        }
        if state.contributes() {
            mapping.insert(state.symbol.clone(), state.address.clone());
        }
    }

    let submit_enabled = !any_invalid && !mapping.is_empty();
    Query {
        mapping,
        submit_enabled,
    }
}
