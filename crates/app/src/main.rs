//! `tutor` - offline STEM lessons from the command line.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use services::{AppServices, Clock};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutor_core::ContentGraph;

mod cli;
mod commands;
mod db;

use cli::Args;

const DEFAULT_LOG_FILTER: &str = "tutor=info,services=info,storage=warn";

fn load_catalog(path: Option<&Path>) -> Result<ContentGraph> {
    let Some(path) = path else {
        return ContentGraph::builtin().context("built-in catalog is invalid");
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    ContentGraph::from_json(&raw).with_context(|| format!("loading catalog {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let catalog = load_catalog(args.catalog.as_deref())?;
    let db_url = db::normalize_sqlite_url(&args.db)?;
    db::prepare_sqlite_dir(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), catalog)
        .await
        .with_context(|| format!("opening database {db_url}"))?;
    debug!(db = %db_url, "storage ready");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    commands::run(&app, args.command, &mut stdin.lock(), &mut stdout.lock()).await
}
