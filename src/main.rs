use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use paw_match::config::{Settings, StoreBackend};
use paw_match::routes::{self, AppState};
use paw_match::services::{MatchStore, MemoryStore, PostgresStore, ProfileStore, TokenVerifier};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    if origins.is_empty() {
        return Cors::permissive();
    }

    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting PawMatch service...");

    if settings.auth.jwt_secret == "change-me" {
        warn!("auth.jwt_secret is the default placeholder; set JWT_SECRET in production");
    }

    let (profile_store, match_store): (Arc<dyn ProfileStore>, Arc<dyn MatchStore>) =
        match settings.database.backend {
            StoreBackend::Postgres => {
                let store = PostgresStore::from_settings(
                    &settings.database.url,
                    settings.database.max_connections,
                    settings.database.min_connections,
                    settings.database.acquire_timeout_secs,
                    settings.database.idle_timeout_secs,
                )
                .await
                .map_err(|e| {
                    error!("Failed to connect to PostgreSQL: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;

                info!(
                    "PostgreSQL store initialized (max: {} connections)",
                    settings.database.max_connections.unwrap_or(10)
                );
                let store = Arc::new(store);
                let profiles: Arc<dyn ProfileStore> = store.clone();
                let matches: Arc<dyn MatchStore> = store;
                (profiles, matches)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store; data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                let profiles: Arc<dyn ProfileStore> = store.clone();
                let matches: Arc<dyn MatchStore> = store;
                (profiles, matches)
            }
        };

    let verifier = Arc::new(TokenVerifier::new(&settings.auth.jwt_secret));

    let app_state = AppState::new(
        profile_store,
        match_store,
        verifier,
        &settings.matching,
        &settings.cache,
    );

    info!(
        "Profile cache: {} entries, TTL {}s",
        settings.cache.profile_cache_size, settings.cache.ttl_secs
    );

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let cors_origins = settings.server.cors_origins.clone();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .wrap(build_cors(&cors_origins))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
