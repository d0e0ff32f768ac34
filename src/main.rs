use anyhow::{Context, Result};
use memsearch::api;
use memsearch::config::{validate_config, ConfigLoader, DEFAULT_CONFIG_FILE};
use memsearch::{ScanEngine, SystemMemory};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = ConfigLoader::new(&config_path)
        .load_or_default()
        .with_context(|| format!("failed to load configuration from {}", config_path))?;
    validate_config(&config).context("invalid configuration")?;

    // Logs go to stderr; stdout carries responses only
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.logging.ansi)
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        parallel = config.scanner.parallel,
        max_threads = config.scanner.max_threads,
        "starting memsearch"
    );

    let engine = Arc::new(ScanEngine::from_config(SystemMemory::new(), &config.scanner)?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let engine = Arc::clone(&engine);
        let response =
            tokio::task::spawn_blocking(move || api::handle_line(&engine, &line)).await?;
        debug!(error = response.is_error(), "request handled");

        let mut output = serde_json::to_string(&response)?;
        output.push('\n');
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("input closed, shutting down");
    Ok(())
}
