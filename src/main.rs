//! Crypto Signal Desk: binary entrypoint.
//! `serve` (default) boots the Axum HTTP server; `render <file>` prints the
//! derived view of a snapshot file as JSON.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_signal_desk::{
    config, ingest::fetch_once, metrics::Metrics, router, AppState, DeskConfig, FileSource,
    UpstashSource, ViewOptions,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crypto_signal_desk=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading desk config")?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => serve(cfg).await,
        Some("render") => {
            let Some(path) = args.get(1) else {
                bail!("usage: crypto-signal-desk render <snapshot.json> [--high-impact]");
            };
            let high = args.iter().skip(2).any(|a| a == "--high-impact");
            render(&cfg, path, high).await
        }
        Some(other) => bail!("unknown command `{other}` (expected `serve` or `render`)"),
    }
}

async fn serve(cfg: DeskConfig) -> Result<()> {
    let metrics = Metrics::init(&cfg.engine)?;
    let source = UpstashSource::from_config(&cfg.upstash).context("configuring upstash source")?;
    tracing::info!(endpoint = source.endpoint(), "snapshot source ready");

    let state = AppState::new(Arc::new(source), cfg.engine);
    let app = router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(bind = %cfg.server.bind, "listening");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}

async fn render(cfg: &DeskConfig, path: &str, only_high_impact: bool) -> Result<()> {
    let source = FileSource::new(path);
    let snap = fetch_once(&source)
        .await
        .with_context(|| format!("reading snapshot {path}"))?;
    let opts = ViewOptions {
        now: Utc::now(),
        only_high_impact,
    };
    let view = crypto_signal_desk::build_view(&snap, &opts, &cfg.engine);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
