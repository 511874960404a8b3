// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SYMFIND_LOG";

/// One-shot mode leaves the terminal alone, so logs go to stderr.
pub fn init_stderr(config: &Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(config)?)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow!("install logger: {error}"))
}

/// The TUI draws on stdout and reads raw keys, so anything written to the
/// terminal would corrupt the screen. Logs go to `[log].file` or nowhere.
pub fn init_for_tui(config: &Config) -> Result<()> {
    let Some(path) = config.log_file() else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| {
            format!(
                "open log file {}; fix [log].file or remove it",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter_for(config)?)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("install logger: {error}"))
}

fn filter_for(config: &Config) -> Result<EnvFilter> {
    resolve_filter(env::var(LOG_ENV).ok().as_deref(), config.log_level())
}

fn resolve_filter(from_env: Option<&str>, configured: &str) -> Result<EnvFilter> {
    match from_env {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .with_context(|| format!("{LOG_ENV}={directives:?} is not a valid log filter")),
        _ => EnvFilter::try_new(configured)
            .with_context(|| format!("[log].level {configured:?} is not a valid log filter")),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_filter;
    use anyhow::Result;

    #[test]
    fn env_directives_win_over_config() -> Result<()> {
        let filter = resolve_filter(Some("symfind_api=debug"), "warn")?;
        assert!(filter.to_string().contains("symfind_api=debug"));
        Ok(())
    }

    #[test]
    fn blank_env_falls_back_to_config_level() -> Result<()> {
        let filter = resolve_filter(Some("  "), "info")?;
        assert!(filter.to_string().contains("info"));

        let filter = resolve_filter(None, "warn")?;
        assert!(filter.to_string().contains("warn"));
        Ok(())
    }

    #[test]
    fn invalid_env_directives_name_the_variable() {
        let error = resolve_filter(Some("symfind=loud"), "warn").expect_err("bad filter");
        assert!(error.to_string().contains("SYMFIND_LOG"));
    }
}
