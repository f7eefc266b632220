//! HTTP service for docx-translate.
//!
//! ## Usage
//!
//! ```bash
//! docx-translate-server --config config.toml --port 8000
//!
//! curl -F "file=@report.docx" -F "direction=ar-to-en" \
//!   -o translated_report.docx http://localhost:8000/translate-document/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use docx_translate::server::{build_router, AppState};
use docx_translate::{build_client, Credential, FileConfig, TranslatorConfig};
use std::io;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Serve the .docx translation endpoint over HTTP.
#[derive(Parser, Debug)]
#[command(name = "docx-translate-server", version, about)]
struct Cli {
    /// Path to config.toml.
    #[arg(long, env = "DOCX_TRANSLATE_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Bind address. Default: `[server].host` from the config file.
    #[arg(long, env = "DOCX_TRANSLATE_HOST")]
    host: Option<String>,

    /// Bind port. Default: `[server].port` from the config file.
    #[arg(long, env = "DOCX_TRANSLATE_PORT")]
    port: Option<u16>,

    /// Groq API key (overrides config.toml).
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with_writer(io::stderr)
        .init();

    // A missing or broken config file does not stop the service; requests
    // fail with a configuration error until the key is provided.
    let (file, load_error) = match FileConfig::load(&cli.config) {
        Ok(file) => (file, None),
        Err(e) => (FileConfig::default(), Some(e.to_string())),
    };

    let mut builder = TranslatorConfig::builder_from_file(&file);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    } else if let Some(reason) = load_error {
        warn!("{}", reason);
        builder = builder.credential(Credential::Missing { reason });
    }
    let config = builder.build().context("Invalid configuration")?;
    if config.uses_groq() && !config.credential.is_present() {
        warn!("No Groq API key configured; translation requests will fail");
    }
    let client = build_client(&config).context("Failed to set up translation client")?;

    let state = AppState::new(client, file.server.staging_dir.clone())
        .with_max_upload_mb(file.server.max_upload_mb);
    let app = build_router(state);

    let host = cli.host.unwrap_or(file.server.host);
    let port = cli.port.unwrap_or(file.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    info!(
        "Listening on http://{} ({} / {})",
        listener.local_addr().context("local address")?,
        config.provider_name,
        config.model
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
