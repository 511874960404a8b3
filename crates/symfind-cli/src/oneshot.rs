// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::io::Write;
use symfind_api::Client;
use symfind_app::{FindRequest, FormCommand, HashFilter, ResultEntry, RowField, SearchForm};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneShotSearch {
    pub symbols: Vec<(String, String)>,
    pub hashes: Vec<(HashFilter, String)>,
}

impl OneShotSearch {
    pub fn is_requested(&self) -> bool {
        !self.symbols.is_empty() || !self.hashes.is_empty()
    }
}

/// Types every pair into the trailing blank row of a fresh form, so the
/// command line gets the same validation and duplicate handling as the TUI.
pub fn build_request(search: &OneShotSearch) -> Result<FindRequest> {
    let mut form = SearchForm::new();
    for (symbol, address) in &search.symbols {
        let row = form
            .last_row()
            .ok_or_else(|| anyhow!("search form has no open row"))?;
        form.dispatch(FormCommand::Edit {
            id: row,
            field: RowField::Symbol,
            value: symbol.clone(),
        });
        form.dispatch(FormCommand::Edit {
            id: row,
            field: RowField::Address,
            value: address.clone(),
        });
        if address.is_empty() {
            warn!(%symbol, "symbol without an address is left out of the search");
        }
    }

    if let Some(row) = form.rows().into_iter().find(|row| !row.valid) {
        bail!(
            "--symbol {}={} has an invalid address; use hex digits with an optional 0x prefix",
            row.symbol,
            row.address
        );
    }

    let mut request = form.query().to_request();
    for (filter, value) in &search.hashes {
        request.set_hash(*filter, value.clone());
    }
    if request.is_empty() {
        bail!("nothing to search for -- pass --symbol <name>=<address> or a hash flag such as --buildid");
    }
    Ok(request)
}

pub fn run<W: Write>(client: &Client, search: &OneShotSearch, out: &mut W) -> Result<()> {
    let request = build_request(search)?;
    info!(
        base_url = client.base_url(),
        symbols = request.symbols.len(),
        "running one-shot search"
    );
    let entries = client.find(&request)?;
    write_entries(&entries, out).context("write search results")
}

pub fn write_entries<W: Write>(entries: &[ResultEntry], out: &mut W) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "no matches")?;
        return Ok(());
    }

    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", entry.id)?;
        writeln!(out, "  download  {}", entry.download_url)?;
        writeln!(out, "  buildid   {}", entry.buildid.as_deref().unwrap_or("-"))?;
        writeln!(out, "  md5       {}", entry.md5.as_deref().unwrap_or("-"))?;
        if let Some(sha1) = &entry.sha1 {
            writeln!(out, "  sha1      {sha1}")?;
        }
        if let Some(sha256) = &entry.sha256 {
            writeln!(out, "  sha256    {sha256}")?;
        }
        for (name, address) in &entry.symbols {
            writeln!(out, "  {name:<24} {address}")?;
        }
    }
    Ok(())
}
