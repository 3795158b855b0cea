//! All-in-one server for the ledger service

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use clap::Parser;
use dotenv::dotenv;
use tokio::signal;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use uuid::Uuid;

use api_gateway::config::GatewayConfig;
use api_gateway::AppState;
use common::dec;
use ledger_service::{build_store, LedgerConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Run with demo data
    #[clap(short, long)]
    demo: bool,
}

// Static variable to track service start time
static START_TIME: AtomicU64 = AtomicU64::new(0);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    // Create an environment filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,ledger_service=debug,ledger_store=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        if env_debug == "1" {
            debug!("Debug logging enabled");
        }
    }

    info!("Starting ledger server...");

    // Initialize service start time for uptime tracking
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    START_TIME.store(now, Ordering::Relaxed);

    // Initialize the store and wire the services over it
    let config = LedgerConfig::from_env();
    info!(
        "Using the {:?} store with up to {} transfer retries",
        config.store, config.max_transfer_retries
    );

    let store = build_store(&config).await?;
    let state = Arc::new(AppState::new(store, &config));

    // Create demo data if requested
    if args.demo {
        info!("Creating demo data...");
        create_demo_data(&state).await?;
    }

    // Combine the health route with the gateway routes
    let health_routes = axum::Router::new()
        .route("/health", axum::routing::get(health_check))
        .with_state(state.clone());

    let app = health_routes.merge(api_gateway::router(state));

    // Start the server
    let addr = GatewayConfig::new().bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Starting API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let start_time = Instant::now();

    // Probe the account service; any answer for the nil UUID means the
    // service and its store are responsive
    let as_start = Instant::now();
    let account_service_status = match state.account_service.get_account(Uuid::nil()).await {
        Ok(_) => "up",
        Err(common::error::Error::AccountNotFound(_)) => "up",
        Err(_) => "down",
    };
    let account_service_latency = as_start.elapsed().as_millis() as u64;

    // Probe the query service the same way
    let qs_start = Instant::now();
    let query_service_status = match state
        .query_service
        .get_account_with_history(Uuid::nil())
        .await
    {
        Ok(_) => "up",
        Err(common::error::Error::AccountNotFound(_)) => "up",
        Err(_) => "down",
    };
    let query_service_latency = qs_start.elapsed().as_millis() as u64;

    // Overall status depends on all services
    let overall_status = if account_service_status == "up" && query_service_status == "up" {
        "healthy"
    } else {
        "degraded"
    };

    // Get system metrics
    let memory_usage = get_memory_usage_mb();
    let uptime = get_uptime_seconds();

    // Total response time for this health check
    let total_latency = start_time.elapsed().as_millis() as u64;

    // Build the health information JSON
    let health_info = serde_json::json!({
        "service": "ledger-server",
        "status": overall_status,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "services": {
            "account_service": {
                "status": account_service_status,
                "latency_ms": account_service_latency
            },
            "query_service": {
                "status": query_service_status,
                "latency_ms": query_service_latency
            }
        },
        "system": {
            "memory_usage_mb": memory_usage,
        },
        "health_check_latency_ms": total_latency
    });

    if overall_status == "healthy" {
        (axum::http::StatusCode::OK, Json(health_info))
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, Json(health_info))
    }
}

// Helper function to get uptime in seconds
fn get_uptime_seconds() -> u64 {
    let current_start = START_TIME.load(Ordering::Relaxed);
    if current_start == 0 {
        // First call, initialize start time
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        START_TIME.store(now, Ordering::Relaxed);
        return 0;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    now.saturating_sub(current_start)
}

// Helper function to get memory usage in MB
fn get_memory_usage_mb() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(contents) = std::fs::read_to_string("/proc/self/status") {
            if let Some(kb) = contents
                .lines()
                .find(|l| l.starts_with("VmRSS:"))
                .and_then(|l| l.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok())
            {
                // Convert KB to MB
                return kb / 1024;
            }
        }
    }

    // Default if we can't get the actual usage or not on Linux
    0
}

/// Create demo data for exercising the API
async fn create_demo_data(state: &AppState) -> common::error::Result<()> {
    // Two demo accounts with a starting balance
    let alice = state
        .account_service
        .create_account("Alice", dec!(1000))
        .await?;
    let bob = state
        .account_service
        .create_account("Bob", dec!(1000))
        .await?;

    info!("Created demo accounts: Alice = {}, Bob = {}", alice.id, bob.id);

    // A couple of transfers so the ledger opens with some history
    let first = state
        .transfer_engine
        .transfer(alice.id, bob.id, dec!(125.50))
        .await?;
    let second = state
        .transfer_engine
        .transfer(bob.id, alice.id, dec!(40))
        .await?;

    info!("Seeded demo transfers: {} and {}", first, second);

    let view = state
        .query_service
        .get_account_with_history(alice.id)
        .await?;
    info!(
        "Alice now holds {} after {} ledger entries",
        view.account.balance,
        view.entries.len()
    );

    info!("Demo data created successfully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
