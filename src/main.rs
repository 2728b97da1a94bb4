use std::sync::Arc;

use photo_places::core::config::Config;
use photo_places::core::database;
use photo_places::features::association::AssociationService;
use photo_places::features::photos::{PgContentStore, PhotoService};
use photo_places::features::places::{PgPlaceIndex, PlaceService};
use photo_places::features::seeding::SeedService;
use photo_places::modules::image_metadata::ExifLocationExtractor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    let place_index = Arc::new(PgPlaceIndex::new(pool.clone()));
    let content_store = Arc::new(PgContentStore::new(pool.clone(), &config.storage));

    let photo_service = Arc::new(PhotoService::new(
        content_store.clone(),
        Arc::new(ExifLocationExtractor::new()),
        place_index.clone(),
    ));
    let place_service = Arc::new(PlaceService::new(place_index.clone(), content_store));
    let association_service = Arc::new(AssociationService::new(
        place_index,
        Arc::clone(&photo_service),
    ));
    tracing::info!("Services initialized");

    let seed_service = SeedService::new(place_service, photo_service, association_service);
    let report = seed_service.run(&config.seed).await?;

    tracing::info!(
        "Places with photos: {}",
        serde_json::to_string(&report.addresses_with_photos)?
    );
    tracing::info!(
        "Seed report: places_loaded={}, photos_stored={}, photos_skipped={}, photos_associated={}",
        report.places_loaded,
        report.photos_stored,
        report.photos_skipped,
        report.photos_associated
    );

    pool.close().await;
    Ok(())
}
