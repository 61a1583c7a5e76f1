//! interestd: serves the demo page as a streamed HTML document.
//!
//! # Usage
//!
//! ```text
//! interestd serve --config interest.toml --port 8080
//! interestd render
//! ```

mod app;

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use interest_http::{HtmlDocument, HtmlServer, ShellConfig};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "interestd", version, about = "Streaming HTML page server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the page over HTTP.
    Serve {
        /// Path to interest.toml.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config).
        #[arg(long)]
        port: Option<u16>,

        /// Address to listen on (overrides the config).
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Render the page to stdout, chunk by chunk.
    Render {
        /// Path to interest.toml.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,interestd=debug,interest=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port, bind } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            serve(config).await
        }
        Command::Render { config } => render(load_config(config.as_deref())?).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ShellConfig> {
    match path {
        Some(path) => {
            let config = ShellConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(ShellConfig::default()),
    }
}

async fn serve(config: ShellConfig) -> anyhow::Result<()> {
    let server = HtmlServer::new(&config, Arc::new(app::page));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(server.serve(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to install CTRL+C handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    handle.await??;
    info!("interestd stopped");
    Ok(())
}

async fn render(config: ShellConfig) -> anyhow::Result<()> {
    let document = HtmlDocument::open(&config.document_options(), config.queue.capacity)?;
    let mut chunks = document.chunks().stream();

    let renderer = document.clone();
    tokio::spawn(async move { renderer.render_page(app::page()).await });

    let mut stdout = std::io::stdout().lock();
    let mut count = 0usize;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.context("page render failed")?;
        count += 1;
        debug!(index = count, len = chunk.len(), "chunk");
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}
