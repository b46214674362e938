use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use blog_service::config::StorageConfig;
use blog_service::db::{create_pool, BlogStore, MemoryStore, PgBlogStore};
use blog_service::handlers;
use blog_service::middleware::{JwtKeys, PrincipalMiddleware};
use blog_service::render::{JsonRenderer, Renderer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Blog Service
///
/// # Routes
///
/// - `/` and `/category/*` - Public post listings
/// - `/posts/*` - Post detail, post and comment mutations
/// - `/profile/*` - Author pages and profile edit
/// - `/health`, `/health/live` - Health checks
///
/// Runs on port 8080 (configurable via BLOG_SERVICE_PORT env var).
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match blog_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store: Arc<dyn BlogStore> = match &config.storage {
        StorageConfig::Postgres(db_config) => {
            let pool = create_pool(db_config).await.map_err(|e| {
                tracing::error!("Database pool creation failed: {:#}", e);
                io::Error::new(io::ErrorKind::Other, format!("Failed to create pool: {e}"))
            })?;
            Arc::new(PgBlogStore::new(pool))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let renderer: Arc<dyn Renderer> = Arc::new(JsonRenderer);

    let store_data = web::Data::from(store);
    let renderer_data = web::Data::from(renderer);
    let jwt_keys = JwtKeys::from_secret(&config.auth.jwt_secret);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("HTTP server listening on {}", bind_address);

    HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(store_data.clone())
            .app_data(renderer_data.clone())
            .wrap(PrincipalMiddleware::new(jwt_keys.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
