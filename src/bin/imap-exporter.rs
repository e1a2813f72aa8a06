#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Prometheus exporter for IMAP mailbox message counts

use anyhow::Context;
use clap::Parser;
use imap_messages_exporter::{Collector, Config, FetchTally, server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-exporter")]
#[command(about = "Export IMAP mailbox message counts to Prometheus")]
struct Args {
    /// JSON configuration file
    config: PathBuf,

    /// Listen address, overriding the configuration file
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Collect once, print the result and exit
    #[arg(long)]
    once: bool,

    /// With --once, print samples as JSON instead of Prometheus text
    #[arg(long, requires = "once")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let listen = args.listen.unwrap_or(config.listen);

    info!(
        "Loaded {} account(s) from {}",
        config.accounts.len(),
        args.config.display()
    );

    let collector = Arc::new(Collector::new(
        config.accounts,
        Arc::new(FetchTally::new()?),
    ));

    if args.once {
        return cmd_once(&collector, args.json).await;
    }

    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    server::serve(listener, collector).await?;
    Ok(())
}

async fn cmd_once(collector: &Collector, json: bool) -> anyhow::Result<()> {
    if json {
        let snapshot = collector.collect().await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", collector.scrape().await?);
    }
    Ok(())
}
