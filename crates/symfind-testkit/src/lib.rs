// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use symfind_app::ResultEntry;
use tiny_http::{Header, Response, Server};

const REQUEST_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl MockResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "application/json",
        }
    }

    pub fn entries(entries: &[ResultEntry]) -> Result<Self> {
        let body = serde_json::to_string(entries).context("encode mock entries")?;
        Ok(Self::json(body))
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/problem+json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).with_context(|| format!("decode body {:?}", self.body))
    }
}

/// Serves the given responses in order, one per incoming request, then
/// shuts down. Requests are recorded for later assertions.
pub struct MockSearchServer {
    base_url: String,
    requests: Receiver<RecordedRequest>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl MockSearchServer {
    pub fn start(responses: Vec<MockResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}/api", server.server_addr());
        let (tx, requests) = mpsc::channel();

        let handle = thread::spawn(move || -> Result<()> {
            for response in responses {
                let mut request = server
                    .recv_timeout(REQUEST_WAIT)
                    .context("receive mock request")?
                    .ok_or_else(|| anyhow!("mock server waited too long for a request"))?;

                let mut body = String::new();
                request
                    .as_reader()
                    .read_to_string(&mut body)
                    .context("read mock request body")?;
                let content_type = request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv("Content-Type"))
                    .map(|header| header.value.as_str().to_owned());

                let _ = tx.send(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    content_type,
                    body,
                });

                let header = Header::from_bytes("Content-Type", response.content_type)
                    .map_err(|()| anyhow!("invalid mock content type"))?;
                request
                    .respond(
                        Response::from_string(response.body)
                            .with_status_code(response.status)
                            .with_header(header),
                    )
                    .context("send mock response")?;
            }
            Ok(())
        });

        Ok(Self {
            base_url,
            requests,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn next_request(&self) -> Result<RecordedRequest> {
        self.requests
            .recv_timeout(REQUEST_WAIT)
            .context("wait for recorded request")
    }

    /// Waits until every queued response was served.
    pub fn finish(mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .join()
            .map_err(|_| anyhow!("mock server thread panicked"))?
    }
}

/// An address guaranteed to refuse connections.
pub fn unreachable_base_url() -> &'static str {
    "http://127.0.0.1:1/api"
}

pub fn sample_entry(id: &str, symbols: &[(&str, &str)]) -> ResultEntry {
    ResultEntry {
        id: id.to_owned(),
        buildid: Some(format!("{:0>40}", id.len())),
        md5: Some(format!("{:0>32}", id.len())),
        sha1: None,
        sha256: None,
        symbols: symbols
            .iter()
            .map(|(name, address)| ((*name).to_owned(), (*address).to_owned()))
            .collect::<BTreeMap<_, _>>(),
        download_url: format!("https://libc.rip/download/{id}.so"),
    }
}

pub fn libc_entries() -> Vec<ResultEntry> {
    vec![
        sample_entry(
            "libc6_2.27-3ubuntu1_amd64",
            &[("puts", "0x809c0"), ("system", "0x4f440")],
        ),
        sample_entry(
            "libc6_2.27-3ubuntu1.2_amd64",
            &[("puts", "0x809c0"), ("system", "0x4f4e0")],
        ),
    ]
}
