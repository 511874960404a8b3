// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::collections::BTreeMap;
use std::time::Duration;
use symfind_api::Client;
use symfind_app::{FindRequest, HashFilter};
use symfind_testkit::{MockResponse, MockSearchServer, libc_entries, unreachable_base_url};

fn puts_request() -> FindRequest {
    FindRequest::from_symbols(BTreeMap::from([
        ("puts".to_owned(), "0x9c0".to_owned()),
        ("system".to_owned(), "440".to_owned()),
    ]))
}

#[test]
fn find_posts_symbols_and_decodes_entries() -> Result<()> {
    let server = MockSearchServer::start(vec![MockResponse::entries(&libc_entries())?])?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;

    let entries = client.find(&puts_request())?;
    assert_eq!(entries, libc_entries());

    let request = server.next_request()?;
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/find");
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        request.json()?,
        serde_json::json!({"symbols": {"puts": "0x9c0", "system": "440"}})
    );

    server.finish()
}

#[test]
fn find_sends_hash_filters_next_to_symbols() -> Result<()> {
    let server = MockSearchServer::start(vec![MockResponse::json("[]")])?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;

    let mut request = FindRequest::default();
    request.set_hash(HashFilter::Md5, "50390b2ae8aaa73c47745040f54e602f");
    assert!(client.find(&request)?.is_empty());

    let recorded = server.next_request()?.json()?;
    assert_eq!(recorded["md5"], "50390b2ae8aaa73c47745040f54e602f");
    assert_eq!(recorded["symbols"], serde_json::json!({}));

    server.finish()
}

#[test]
fn find_accepts_null_build_id() -> Result<()> {
    let body = r#"[{"id":"libc6_2.19","buildid":null,"md5":"a","sha1":"b","sha256":"c","symbols":{"puts":"0x6fd60"},"download_url":"http://foo.bar"}]"#;
    let server = MockSearchServer::start(vec![MockResponse::json(body)])?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;

    let entries = client.find(&puts_request())?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].buildid, None);
    assert_eq!(entries[0].sha256.as_deref(), Some("c"));
    assert_eq!(entries[0].download_url, "http://foo.bar");

    server.finish()
}

#[test]
fn non_success_status_becomes_error() -> Result<()> {
    let server = MockSearchServer::start(vec![MockResponse::status(
        400,
        r#"{"title":"Bad request","detail":"must provide at least one filter","status":400}"#,
    )])?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;

    let error = client
        .find(&puts_request())
        .expect_err("400 should surface as error");
    let message = error.to_string();
    assert!(message.contains("400"), "unexpected message: {message}");
    assert!(message.contains("at least one filter"));

    server.finish()
}

#[test]
fn malformed_json_is_a_decode_error() -> Result<()> {
    let server = MockSearchServer::start(vec![MockResponse::json("<html>nope</html>")])?;
    let client = Client::new(server.base_url(), Duration::from_secs(2))?;

    let error = client
        .find(&puts_request())
        .expect_err("html body should not decode");
    assert!(error.to_string().contains("decode find response"));

    server.finish()
}

#[test]
fn empty_request_is_refused_without_network() -> Result<()> {
    let client = Client::new(unreachable_base_url(), Duration::from_millis(50))?;
    let error = client
        .find(&FindRequest::default())
        .expect_err("empty request should fail");
    assert!(error.to_string().contains("at least one filter"));
    Ok(())
}

#[test]
fn unreachable_server_error_names_config_key() -> Result<()> {
    let client = Client::new(unreachable_base_url(), Duration::from_millis(200))?;
    let error = client
        .find(&puts_request())
        .expect_err("unreachable server should fail");
    let message = error.to_string();
    assert!(message.contains("[api]"), "unexpected message: {message}");
    Ok(())
}
