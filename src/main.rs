use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use youth_policy_match::config::{LoggingSettings, Settings};
use youth_policy_match::core::Matcher;
use youth_policy_match::models::ScoringWeights;
use youth_policy_match::routes::{
    self, handle_json_payload_error, handle_query_payload_error, AppState,
};
use youth_policy_match::services::{
    CacheManager, ExplainerClient, PolicyCatalog, PostgresStore, RateLimiter,
};

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting youth policy matching service...");

    // Cache: Redis is optional, L1 always available
    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => match CacheManager::new(url, settings.cache.l1_cache_size, settings.cache.ttl_secs).await {
            Ok(c) => {
                info!(
                    "Cache manager initialized with Redis (L1: {} entries, TTL: {}s)",
                    settings.cache.l1_cache_size, settings.cache.ttl_secs
                );
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-memory cache only", e);
                CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs)
            }
        },
        None => CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs),
    };
    let cache = Arc::new(cache);

    // Policy store: optional, the built-in catalog is served without it
    let store = match settings.database.url.as_deref() {
        Some(url) => {
            let max_conn = settings.database.max_connections.unwrap_or(10);
            let min_conn = settings.database.min_connections.unwrap_or(1);
            match PostgresStore::new(
                url,
                max_conn,
                min_conn,
                settings.database.acquire_timeout(),
                settings.database.idle_timeout(),
            )
            .await
            {
                Ok(store) => {
                    info!("PostgreSQL store initialized (max: {} connections)", max_conn);
                    Some(Arc::new(store))
                }
                Err(e) => {
                    warn!("Failed to connect to PostgreSQL ({}), serving built-in catalog", e);
                    None
                }
            }
        }
        None => {
            info!("No database configured, serving built-in catalog");
            None
        }
    };

    let catalog = Arc::new(PolicyCatalog::new(store.clone(), cache));

    let explainer = match ExplainerClient::new(
        settings.explainer.endpoint.clone(),
        settings.explainer.api_key.clone(),
        settings.explainer.model.clone(),
        settings.explainer.timeout_secs,
    ) {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build explanation client ({}), using templates", e);
            ExplainerClient::disabled()
        }
    };
    info!(
        "Explanation service: {}",
        if explainer.is_enabled() { "remote" } else { "template" }
    );

    let rate_limiter = RateLimiter::new(
        settings.rate_limit.max_requests,
        Duration::from_secs(settings.rate_limit.window_secs),
        Duration::from_secs(settings.rate_limit.block_secs),
        settings.rate_limit.tracked_clients,
    );

    // Initialize matcher with configured weights
    let weights = ScoringWeights::from(&settings.scoring.weights);
    let matcher = Matcher::new(weights);

    info!("Matcher initialized with weights: {:?}", weights);

    let app_state = AppState {
        catalog,
        store,
        matcher,
        explainer: Arc::new(explainer),
        rate_limiter: Arc::new(rate_limiter),
        matching: settings.matching.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
