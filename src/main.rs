use tower_http::trace::TraceLayer;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flood_watch_service::api::{create_router, AppState};
use flood_watch_service::catalog;
use flood_watch_service::config::Config;
use flood_watch_service::cycle::CycleCoordinator;
use flood_watch_service::radar_fetcher::RadarFetcher;
use flood_watch_service::scheduler;
use flood_watch_service::snapshot::SnapshotStore;
use flood_watch_service::station_fetcher::StationFetcher;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,flood_watch_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting flood watch service with config: {:?}", config);

    // Load the basin catalogue (immutable for the life of the process)
    let basins = catalog::load_catalog(&config.basin_catalog_path)?;

    // Create feed clients
    let station_fetcher = StationFetcher::new(config.station_feed_url.clone());
    let radar_fetcher = config
        .aemet_api_key
        .clone()
        .map(|key| RadarFetcher::new(config.radar_url.clone(), key));
    if radar_fetcher.is_none() {
        info!("AEMET_API_KEY not set, radar disabled, running gauge-only");
    }

    // Snapshot store shared between the coordinator and the API
    let store = SnapshotStore::new();
    let coordinator = CycleCoordinator::new(
        basins.clone(),
        station_fetcher,
        radar_fetcher,
        store.clone(),
    );

    // Start the processing cycle scheduler
    info!("Starting cycle scheduler");
    let cycle_interval = config.cycle_interval_minutes;
    tokio::spawn(async move {
        scheduler::start_cycle_scheduler(coordinator, cycle_interval).await;
    });

    // Create API router
    let app_state = AppState {
        store,
        basins: std::sync::Arc::new(basins),
    };
    let app = create_router(app_state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
