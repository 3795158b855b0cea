use clap::{Parser, Subcommand};
use ledger_service::{
    build_store, AccountQueryService, AccountRepository, AccountService, EntryRepository,
    LedgerConfig, StoreKind, TransferEngine,
};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ledger service
    Start {
        /// Store backend to use (memory or postgres)
        #[arg(short, long)]
        store: Option<String>,

        /// Database URL
        #[arg(short, long)]
        database_url: Option<String>,

        /// Database pool size
        #[arg(short, long)]
        pool_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ledger_service={}",
            cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Process commands
    match cli.command {
        Commands::Start {
            store,
            database_url,
            pool_size,
        } => {
            // Create config using provided values or env vars
            let config = if let Some(url) = database_url {
                let kind = store
                    .as_deref()
                    .map(StoreKind::from_value)
                    .unwrap_or(StoreKind::Postgres);
                LedgerConfig::new(kind, url, pool_size.unwrap_or(5))
            } else {
                let mut config = LedgerConfig::from_env();
                if let Some(value) = store {
                    config.store = StoreKind::from_value(&value);
                }
                config
            };

            info!(
                "Starting ledger service on the {:?} store (pool size {}, {} conflict retries)",
                config.store, config.db_pool_size, config.max_transfer_retries
            );

            // Initialize services
            let ledger_store = build_store(&config).await?;
            let _engine = TransferEngine::with_config(ledger_store.clone(), &config);
            let _accounts = AccountService::new(ledger_store.clone());
            let _queries = AccountQueryService::new(
                AccountRepository::new(ledger_store.clone()),
                EntryRepository::new(ledger_store),
            );

            // Wait for ctrl-c
            info!("Ledger service started. Press Ctrl+C to stop.");
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutting down ledger service...");
                }
                Err(err) => {
                    error!("Error waiting for Ctrl+C: {}", err);
                }
            }
        }
    }

    Ok(())
}
