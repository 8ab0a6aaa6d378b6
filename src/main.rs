// src/main.rs

//! The `topom` operator binary: runs one administrative command against a node
//! through a pooled client.

use anyhow::Result;
use std::env;
use std::sync::Arc;
use tokio::sync::broadcast;
use topom::cli::{self, USAGE};
use topom::config::TopomConfig;
use topom::core::RedisPool;
use topom::core::metrics::gather_metrics;
use topom::core::redis::PoolOptions;
use topom::core::tasks::pool_cleaner::PoolCleanerTask;
use tracing::error;
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("TOPOM_BUILD_VERSION");

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version") {
        println!("topom version {VERSION}");
        return Ok(());
    }
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let cli_args = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(1);
        }
    };

    let config = match &cli_args.config_path {
        Some(path) => match TopomConfig::from_file(path).await {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e}");
                std::process::exit(1);
            }
        },
        None => TopomConfig::default(),
    };

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    let pool = Arc::new(RedisPool::new(PoolOptions::from(&config.pool)));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let cleaner = tokio::spawn(
        PoolCleanerTask::new(pool.clone(), config.pool.cleanup_interval).run(shutdown_rx),
    );

    let result = cli::execute(&pool, &cli_args.command).await;

    let _ = shutdown_tx.send(());
    let _ = cleaner.await;
    pool.close().await;

    if cli_args.print_metrics {
        print!("{}", gather_metrics());
    }

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            Err(e)
        }
    }
}
