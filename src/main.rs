use gatekeeper_api::{
    auth::{store::run_token_sweeper, PasswordService, TokenService},
    config::AppConfig,
    create_router, db,
    memory::MemoryStore,
    AppState, Stores,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // RUST_LOG wins over the environment's default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.environment.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Gatekeeper API - Starting ({:?})...", config.environment);
    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET is not set; signing tokens with the development key");
    }

    let stores = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let db_pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");

            tracing::info!("Running database migrations...");
            db::run_migrations(&db_pool)
                .await
                .expect("Failed to run database migrations");

            Stores::postgres(db_pool)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
            Stores::memory(MemoryStore::with_bootstrap_roles())
        }
    };

    tokio::spawn(run_token_sweeper(stores.tokens.clone(), config.token_sweep_interval));

    let state = AppState::new(
        stores,
        TokenService::new(config.jwt_secret.clone(), config.jwt_expires_in_minutes),
        PasswordService::default(),
        config.strict_sessions,
    );
    let app = create_router(state);

    // Start the Axum server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Gatekeeper API is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
