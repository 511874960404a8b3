// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::thread;
use symfind_api::Client;
use symfind_app::{FindRequest, ResultEntry};
use symfind_tui::{AppRuntime, SearchGuard};
use tracing::debug;

/// Runs searches against the configured service, one worker thread per
/// submitted search.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for ApiRuntime {
    fn search(&mut self, request: &FindRequest) -> Result<Vec<ResultEntry>> {
        self.client.find(request)
    }

    fn spawn_search(&mut self, request: FindRequest, guard: SearchGuard) -> Result<()> {
        let client = self.client.clone();
        let name = format!("search-{}", guard.request_id());
        debug!(worker = %name, base_url = client.base_url(), "spawning search worker");

        // A failed spawn drops the closure and with it the guard, which
        // still reports the search as settled.
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let outcome = client.find(&request);
                guard.finish(outcome);
            })
            .context("spawn search worker")?;
        Ok(())
    }
}
