//! splitsync: native messaging host for the split-window sync extension.
//!
//! The browser launches this binary and talks to it over stdin/stdout using
//! length-prefixed JSON frames. Stdout carries protocol frames only, so all
//! logging goes to stderr.

mod bridge;
mod cli;
mod scroll_relay;

use std::path::Path;
use std::process::ExitCode;

use splitsync_common::ConfigError;
use splitsync_config::{toml_loader, validation, SplitSyncConfig};
use tracing_subscriber::EnvFilter;

const FALLBACK_DIRECTIVE: &str = "splitsync=info";

fn load_config(path: Option<&str>) -> (SplitSyncConfig, Option<ConfigError>) {
    let loaded = match path {
        Some(path) => toml_loader::load_from_path(Path::new(path)).and_then(|config| {
            validation::validate(&config)?;
            Ok(config)
        }),
        None => splitsync_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (SplitSyncConfig::default(), Some(e)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Logging is configured from the config file, so load it first and
    // report any failure once the subscriber exists.
    let (config, config_error) = load_config(args.config.as_deref());

    let directive = args
        .log_level
        .as_deref()
        .unwrap_or_else(|| config.logging.level.directive());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(directive))
                .unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE)),
        )
        .init();

    tracing::info!(
        origin = args.origin.as_deref().unwrap_or("unknown"),
        "splitsync v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "using default config");
    }

    match bridge::serve(tokio::io::stdin(), tokio::io::stdout(), config).await {
        Ok(()) => {
            tracing::info!("splitsync stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "bridge failed");
            ExitCode::FAILURE
        }
    }
}
