// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use symfind_app::{FindRequest, ResultEntry};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://libc.rip/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for the libc search service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url {base_url:?} must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One `POST /find` exchange. No retries; the caller decides what a
    /// failure means for the display.
    pub fn find(&self, request: &FindRequest) -> Result<Vec<ResultEntry>> {
        request.validate()?;

        let endpoint = format!("{}/find", self.base_url);
        debug!(%endpoint, symbols = request.symbols.len(), "posting search");

        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let entries: Vec<ResultEntry> = response.json().context("decode find response")?;
        info!(count = entries.len(), "search response decoded");
        Ok(entries)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("search at {base_url} timed out -- raise [api].timeout or retry later");
    }
    anyhow!("cannot reach {base_url} -- check [api].base_url and your network ({error})")
}

#[derive(Debug, Deserialize)]
struct ProblemEnvelope {
    title: Option<String>,
    detail: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(problem) = serde_json::from_str::<ProblemEnvelope>(body) {
        let message = match (problem.title, problem.detail) {
            (Some(title), Some(detail)) if !detail.is_empty() => format!("{title}: {detail}"),
            (_, Some(detail)) if !detail.is_empty() => detail,
            (Some(title), _) if !title.is_empty() => title,
            _ => String::new(),
        };
        if !message.is_empty() {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}
