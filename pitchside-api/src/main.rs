use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use pitchside_api::{
    app,
    state::{AppState, AuthConfig},
};
use pitchside_booking::{BookingLedger, ReservationCoordinator};
use pitchside_catalog::{AvailabilityIndex, PlannerConfig, SlotPlanner, VenueDirectory};
use pitchside_shared::models::events::LedgerSink;
use pitchside_store::{AccountStore, JsonlLedgerSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchside_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = pitchside_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Pitchside API on port {}", config.server.port);

    // Durable booking ledger, JSONL file when configured
    let sink: Option<Box<dyn LedgerSink>> = match &config.ledger.file_path {
        Some(path) => Some(Box::new(
            JsonlLedgerSink::open(path)
                .with_context(|| format!("Failed to open ledger file {}", path))?,
        )),
        None => None,
    };

    let accounts = Arc::new(AccountStore::new());
    let venues = Arc::new(VenueDirectory::new());
    let index = Arc::new(AvailabilityIndex::new());
    let ledger = Arc::new(BookingLedger::with_sink(sink));
    let planner = Arc::new(SlotPlanner::new(PlannerConfig {
        min_partial_minutes: config.business_rules.min_partial_minutes,
        max_slots_per_day: config.business_rules.max_slots_per_day,
    }));
    let coordinator = ReservationCoordinator::new(
        index.clone(),
        venues.clone(),
        ledger.clone(),
        config.business_rules.hold_seconds,
    );

    let app_state = AppState {
        accounts,
        venues,
        index,
        planner,
        coordinator,
        ledger,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
