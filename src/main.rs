//! Meeple Server - Board Game Rental
//!
//! REST API server for lending board games.

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use meeple_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Meeple Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, config.auth.clone(), config.users.clone());

    if let Some(admin) = config.users.bootstrap_admin.as_ref() {
        services
            .users
            .ensure_admin(admin)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber: stdout in the configured format, plus an
/// optional daily rolling file
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("meeple_server={},tower_http=debug", config.level)));

    let (file_layer, guard) = match config.file.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "meeple-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }

    guard
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id/loans", get(api::users::get_user_loans))
        .route("/users/:id/reviews", get(api::users::get_user_reviews))
        .route("/users/:id/favorites", get(api::users::list_favorites))
        .route("/users/:id/favorites", post(api::users::add_favorite))
        .route("/users/:id/favorites/:game_id", delete(api::users::remove_favorite))
        // Board games
        .route("/games", get(api::games::list_games))
        .route("/games", post(api::games::create_game))
        .route("/games/:id", get(api::games::get_game))
        .route("/games/:id", put(api::games::update_game))
        .route("/games/:id", delete(api::games::delete_game))
        .route("/games/:id/items", get(api::games::list_game_items))
        .route("/games/:id/items", post(api::games::create_item))
        .route("/games/:id/items/available", get(api::games::list_available_items))
        .route("/games/:id/reviews", get(api::games::list_game_reviews))
        // Items
        .route("/items/borrowed", get(api::items::list_borrowed_items))
        .route("/items/:id", get(api::items::get_item))
        .route("/items/:id", delete(api::items::delete_item))
        .route("/items/:id/state", put(api::items::update_item_state))
        // Categories
        .route("/categories", get(api::categories::list_categories))
        .route("/categories", post(api::categories::create_category))
        .route("/categories/:id", get(api::categories::get_category))
        .route("/categories/:id", delete(api::categories::delete_category))
        .route("/categories/:id/games/:game_id", post(api::categories::add_game))
        .route("/categories/:id/games/:game_id", delete(api::categories::remove_game))
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans", post(api::loans::create_loan))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/approve", post(api::loans::approve_loan))
        .route("/loans/:id/reject", post(api::loans::reject_loan))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/loans/:id/status", put(api::loans::change_loan_status))
        // Reviews
        .route("/reviews", post(api::reviews::create_review))
        .route("/reviews/:id", get(api::reviews::get_review))
        .route("/reviews/:id", put(api::reviews::update_review))
        .route("/reviews/:id", delete(api::reviews::delete_review))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
