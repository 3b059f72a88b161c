use std::sync::Arc;
use std::net::SocketAddr;
use std::path::Path;
use anyhow::Context;
use crew_api::{app, state::AppState};
use crew_core::{Clock, InMemoryScheduleStore, ReservationManager, ScheduleStore, SystemClock};
use crew_store::app_config::{Config, StorageBackend};
use crew_store::{json_store, JsonFileScheduleStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crew_api=debug,crew_core=debug,crew_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting crew scheduler on port {}", config.server.port);

    let store: Arc<dyn ScheduleStore> = match config.storage.backend {
        StorageBackend::Json => Arc::new(
            JsonFileScheduleStore::open(&config.storage.crew_file, &config.storage.schedule_file)
                .await
                .context("Failed to open schedule store")?,
        ),
        StorageBackend::Memory => {
            let crew = json_store::read_crew(Path::new(&config.storage.crew_file))
                .await
                .context("Failed to read crew roster")?;
            tracing::info!("Using in-memory schedule with {} rostered pilots", crew.len());
            Arc::new(InMemoryScheduleStore::new(crew))
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let hold_ttl = config.business_rules.hold_ttl();
    tracing::info!("Pilot holds expire after {} seconds", hold_ttl.num_seconds());

    let reservations = ReservationManager::new(store, clock.clone()).with_hold_ttl(hold_ttl);
    let app_state = AppState {
        reservations: Arc::new(reservations),
        clock,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
