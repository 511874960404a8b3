// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod oneshot;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use oneshot::OneShotSearch;
use runtime::ApiRuntime;
use std::env;
use std::io;
use std::path::PathBuf;
use symfind_app::{AppState, HashFilter};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `symfind --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let base_url = options
        .base_url
        .as_deref()
        .unwrap_or_else(|| config.api_base_url());
    let client = symfind_api::Client::new(base_url, config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values or pass --base-url",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    if options.search.is_requested() {
        logging::init_stderr(&config)?;
        return oneshot::run(&client, &options.search, &mut io::stdout().lock());
    }

    logging::init_for_tui(&config)?;
    info!(base_url = client.base_url(), "starting interactive search");

    let mut state = AppState::default();
    state.expand_single_result = config.expand_single_result();
    let mut runtime = ApiRuntime::new(client);
    symfind_tui::run_app(&mut state, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    search: OneShotSearch,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        base_url: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        search: OneShotSearch::default(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--base-url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--base-url requires a URL"))?;
                options.base_url = Some(value.as_ref().to_owned());
            }
            "--symbol" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--symbol requires <name>=<address>"))?;
                options.search.symbols.push(parse_symbol_pair(value.as_ref())?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag => {
                let Some(filter) = flag.strip_prefix("--").and_then(HashFilter::parse) else {
                    return Err(anyhow!(
                        "unknown argument {flag:?}; run with --help to see supported options"
                    ));
                };
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("{flag} requires a value"))?;
                options
                    .search
                    .hashes
                    .push((filter, value.as_ref().to_owned()));
            }
        }
    }

    Ok(options)
}

fn parse_symbol_pair(raw: &str) -> Result<(String, String)> {
    let (name, address) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--symbol expects <name>=<address>, got {raw:?}"))?;
    if name.is_empty() {
        return Err(anyhow!("--symbol {raw:?} is missing the symbol name"));
    }
    Ok((name.to_owned(), address.to_owned()))
}

fn print_help() {
    println!("symfind: find libc builds by leaked symbol addresses");
    println!("  --config <path>            Use a specific config path");
    println!("  --print-config-path        Print resolved config path");
    println!("  --print-example-config     Print a v1 config template");
    println!("  --base-url <url>           Override [api].base_url");
    println!("  --check                    Validate config and exit");
    println!("  --symbol <name>=<address>  Search once and print results (repeatable)");
    println!("  --id/--md5/--sha1/--sha256/--buildid <value>");
    println!("                             Add an exact-match filter to a one-shot search");
    println!("  --help                     Show this help");
    println!();
    println!("Without --symbol or a hash flag, symfind starts the interactive search.");
}
