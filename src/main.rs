use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use mix_mingle::config::{LoggingSettings, Settings};
use mix_mingle::core::{AccessGuard, MatchEngine, PreferenceStore, SessionResolver};
use mix_mingle::error::{handle_json_payload_error, handle_query_payload_error};
use mix_mingle::middleware_layer::require_session;
use mix_mingle::routes::{self, AppState};
use mix_mingle::services::{
    CacheManager, CandidateSupplier, PostgresStore, SupabaseAuth, SupabaseCandidates, SupabaseClient,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// RUST_LOG takes precedence over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
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

    let settings = Settings::load().map_err(|e| io_error("Failed to load configuration", e))?;

    init_tracing(&settings.logging);

    info!("Starting Mix & Mingle service...");

    info!("Configuration loaded successfully");

    let supabase = Arc::new(
        SupabaseClient::new(
            settings.supabase.url.clone(),
            settings.supabase.anon_key.clone(),
            settings.supabase.service_role_key.clone(),
            settings.supabase.profiles_table.clone(),
        )
        .map_err(|e| io_error("Failed to create Supabase client", e))?,
    );

    let resolver: Arc<dyn SessionResolver> = Arc::new(SupabaseAuth::new(
        supabase.clone(),
        settings.supabase.jwt_secret.as_deref(),
    ));

    if settings.supabase.jwt_secret.is_some() {
        info!("Access tokens verified locally with the project JWT secret");
    } else {
        info!("Access tokens verified against the Supabase auth server");
    }

    let store: Arc<dyn PreferenceStore> = Arc::new(
        PostgresStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| io_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL preference store initialized");

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(120);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = Arc::new(
        CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl)
            .await
            .map_err(|e| io_error("Failed to connect to Redis", e))?,
    );

    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);

    let candidates: Arc<dyn CandidateSupplier> =
        Arc::new(SupabaseCandidates::new(supabase, store.clone()).with_cache(cache));

    let auth = &settings.auth;
    let guard = AccessGuard::new(auth.route_table(), resolver)
        .with_login_path(auth.login_path.clone())
        .with_api_prefix(auth.api_prefix.clone());

    info!("Access guard initialized with {} route rules", guard.routes().rules().len());

    let app_state = AppState {
        guard,
        engine: MatchEngine::new(store),
        candidates,
        cookie_name: Arc::from(auth.cookie_name.as_str()),
        candidate_limits: settings.candidates.clone(),
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
            .wrap(middleware::from_fn(require_session))
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
