mod watch;
mod worker;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::worker::Worker;

#[derive(Debug, Parser)]
#[command(name = "katalog-cli")]
#[command(about = "Capture shop pages and resolve them into the canonical catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve one batch of unprocessed captures.
    Process {
        /// Captures per batch; zero or less falls back to 10, capped at 100.
        #[arg(long, allow_negative_numbers = true)]
        batch_size: Option<i64>,
    },
    /// Run processing and rescrape on their cron schedules until interrupted.
    Watch,
    /// Capture one product page and queue it for processing.
    Scrape {
        #[arg(long)]
        shop: String,
        #[arg(long)]
        url: String,
    },
    /// Re-capture pages whose price has not been refreshed recently.
    Rescrape,
    /// Upsert the shops file into the database.
    SeedShops,
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = katalog_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = katalog_db::PoolConfig::from_app_config(&config);
    let pool = katalog_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = katalog_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
        }
        Commands::SeedShops => {
            let shops = katalog_core::load_shops(&config.shops_path)?;
            let seeded = katalog_db::seed_shops(&pool, &shops.shops).await?;
            tracing::info!(seeded, path = %config.shops_path.display(), "shops seeded");
        }
        Commands::Process { batch_size } => {
            let worker = Worker::new(config, pool, Vec::new())?;
            let cancel = cancel_on_shutdown();
            worker.process(batch_size, &cancel).await?;
        }
        Commands::Scrape { shop, url } => {
            let shops = katalog_core::load_shops(&config.shops_path)?.shops;
            let worker = Worker::new(config, pool, shops)?;
            worker.scrape(&shop, &url).await?;
        }
        Commands::Rescrape => {
            let shops = katalog_core::load_shops(&config.shops_path)?.shops;
            let worker = Worker::new(config, pool, shops)?;
            let cancel = cancel_on_shutdown();
            worker.rescrape(&cancel).await?;
        }
        Commands::Watch => {
            katalog_db::run_migrations(&pool).await?;
            let shops = katalog_core::load_shops(&config.shops_path)?.shops;
            let worker = Arc::new(Worker::new(config, pool, shops)?);
            let cancel = cancel_on_shutdown();
            watch::run(worker, cancel).await?;
        }
    }

    Ok(())
}

/// A token that is cancelled on ctrl-c or SIGTERM.
fn cancel_on_shutdown() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });
    token
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, finishing current work");
}

#[cfg(test)]
mod tests;
