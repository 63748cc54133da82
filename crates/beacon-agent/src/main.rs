// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beacon_ingest::config::PipelineConfig;
use beacon_ingest::pipeline::Pipeline;
use beacon_ingest::store::RedisStore;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Tails a beacon access log and maintains windowed PV/UV counters in Redis.
#[derive(Parser, Debug)]
#[command(name = "beacon-agent", version)]
struct Cli {
    /// Access log file to tail
    #[arg(long, default_value = "./dig.log")]
    access_log: PathBuf,

    /// Number of event worker tasks
    #[arg(long, default_value_t = 5)]
    workers: usize,

    /// Redis connection URL (falls back to REDIS_URL)
    #[arg(long)]
    redis_url: Option<String>,

    /// Write operational logs to this file instead of stdout
    #[arg(short = 'l', long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    info!(
        "starting beacon agent: access_log={:?} workers={}",
        cli.access_log, cli.workers
    );

    let redis_url = cli
        .redis_url
        .or_else(|| env::var("REDIS_URL").ok())
        .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

    // store connectivity is the one startup failure that is fatal by design
    let store = RedisStore::connect(&redis_url)
        .await
        .with_context(|| format!("failed to connect to store at {redis_url}"))?;

    let config = PipelineConfig {
        access_log: cli.access_log,
        workers: cli.workers,
    };
    let pipeline = Pipeline::start(config, Arc::new(store))
        .await
        .context("failed to start pipeline")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, draining pipeline");
    pipeline.shutdown().await;

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("invalid log level {:?}", cli.log_level))?;

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path:?}"))?;
            let subscriber = tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("setting default subscriber failed")?;
        }
        None => {
            let subscriber = tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(filter)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("setting default subscriber failed")?;
        }
    }
    Ok(())
}
