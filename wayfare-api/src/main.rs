use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{
    app,
    state::{AppState, AuthConfig, RateLimiter},
};
use wayfare_booking::{BookingOrchestrator, BookingQueries, PageLimits};
use wayfare_core::repository::{ArchiveWriter, AttemptStore, BookingRepository, ItineraryStore};
use wayfare_core::Itinerary;
use wayfare_store::app_config::{Config, StorageBackend};
use wayfare_store::memory::{
    MemoryArchiveWriter, MemoryAttemptStore, MemoryBookingRepository, MemoryItineraryStore,
};
use wayfare_store::{
    DbClient, PgArchiveWriter, PgBookingRepository, PgItineraryStore, RedisAttemptStore,
    RedisClient,
};

struct Stores {
    itineraries: Arc<dyn ItineraryStore>,
    bookings: Arc<dyn BookingRepository>,
    archive: Arc<dyn ArchiveWriter>,
}

async fn load_seed(path: &str) -> anyhow::Result<Vec<Itinerary>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Seed file {} is not a JSON array of itineraries", path))
}

async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    let seed = match &config.storage.seed_path {
        Some(path) => load_seed(path).await?,
        None => Vec::new(),
    };

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage ({} seeded itineraries)", seed.len());
            Ok(Stores {
                itineraries: Arc::new(MemoryItineraryStore::with_itineraries(seed)),
                bookings: Arc::new(MemoryBookingRepository::new()),
                archive: Arc::new(MemoryArchiveWriter::new()),
            })
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let itineraries = PgItineraryStore::new(db.pool.clone());
            for itinerary in &seed {
                itineraries
                    .save_itinerary(itinerary)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to seed itinerary {}: {}", itinerary.id, e))?;
            }
            tracing::info!("Using Postgres storage ({} seeded itineraries)", seed.len());

            Ok(Stores {
                itineraries: Arc::new(itineraries),
                bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
                archive: Arc::new(PgArchiveWriter::new(db.pool)),
            })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,wayfare_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Wayfare booking API on port {}", config.server.port);

    let stores = build_stores(&config).await?;

    // Redis backs the attempt ledger and rate limiting when configured
    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(
            RedisClient::new(url).await.context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let attempts: Arc<dyn AttemptStore> = match &redis {
        Some(client) => Arc::new(RedisAttemptStore::new(
            client.clone(),
            config.booking.attempt_ttl_seconds,
        )),
        None => {
            tracing::warn!("redis.url not set; booking attempts are kept in memory and rate limiting is off");
            Arc::new(MemoryAttemptStore::new(config.booking.attempt_ttl_seconds))
        }
    };

    let orchestrator = BookingOrchestrator::new(
        stores.itineraries.clone(),
        stores.bookings.clone(),
        stores.archive,
        attempts,
    );
    let queries = BookingQueries::new(
        stores.itineraries,
        stores.bookings,
        PageLimits {
            default_size: config.booking.default_page_size,
            max_size: config.booking.max_page_size,
        },
    );

    let app_state = AppState {
        orchestrator: Arc::new(orchestrator),
        queries: Arc::new(queries),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        rate_limiter: redis.map(|redis| RateLimiter {
            redis,
            requests_per_window: config.rate_limit.requests_per_window,
            window_seconds: config.rate_limit.window_seconds,
        }),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
