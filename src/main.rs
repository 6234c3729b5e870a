//! event-ticketing server entry point.
//!
//! Loads configuration, opens the ticket store and serves the REST API and
//! the `/ws` feed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use event_ticketing::app_state::{AppState, StorageInfo};
use event_ticketing::config::{LogFormat, StoreBackend, TicketingConfig};
use event_ticketing::domain::{EventBus, RandomIdentifiers, SystemClock};
use event_ticketing::export::PlainTextExporter;
use event_ticketing::persistence::{
    EventDirectory, InMemoryEventDirectory, InMemoryTicketStore, PostgresEventDirectory,
    PostgresTicketStore, TicketStore,
};
use event_ticketing::service::ServiceContext;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

type Stores = (Arc<dyn TicketStore>, Arc<dyn EventDirectory>, StorageInfo);

async fn open_stores(config: &TicketingConfig) -> anyhow::Result<Stores> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory ticket store; state is lost on restart");
            Ok((
                Arc::new(InMemoryTicketStore::new()),
                Arc::new(InMemoryEventDirectory::new()),
                StorageInfo::memory(),
            ))
        }
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .min_connections(config.database_min_connections)
                .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                .connect(&config.database_url)
                .await
                .context("connecting to PostgreSQL")?;
            let store = PostgresTicketStore::open(pool.clone(), config.database_run_migrations)
                .await
                .context("opening ticket store")?;
            let storage = StorageInfo {
                backend: StoreBackend::Postgres,
                schema: Some(store.schema()),
            };
            Ok((
                Arc::new(store),
                Arc::new(PostgresEventDirectory::new(pool)),
                storage,
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TicketingConfig::from_env().context("invalid LISTEN_ADDR")?;
    init_tracing(config.log_format);
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.store_backend,
        "starting event-ticketing"
    );

    let (store, events, storage) = open_stores(&config).await?;

    let ctx = ServiceContext {
        store,
        events,
        clock: Arc::new(SystemClock),
        policy: config.policy(),
        event_bus: EventBus::new(config.event_bus_capacity),
    };
    let state = AppState::new(ctx, Arc::new(RandomIdentifiers), Arc::new(PlainTextExporter))
        .with_storage(storage);

    let app = event_ticketing::build_app(state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
