use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{AssetStore, GameStore, GameWorkflow};
use persistence::PgGameStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, security_headers_middleware, trace_id};
use crate::routes::{assets, games, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub workflow: GameWorkflow,
}

/// Builds the application backed by PostgreSQL.
pub fn create_app(config: Config, pool: PgPool, assets: Arc<dyn AssetStore>) -> Router {
    let store: Arc<dyn GameStore> = Arc::new(PgGameStore::new(pool.clone()));
    create_app_with_store(config, pool, store, assets)
}

/// Builds the application over an arbitrary game store.
///
/// `pool` still backs the health probes.
pub fn create_app_with_store(
    config: Config,
    pool: PgPool,
    store: Arc<dyn GameStore>,
    assets: Arc<dyn AssetStore>,
) -> Router {
    let config = Arc::new(config);
    let workflow = GameWorkflow::new(store, assets, config.workflow.operation_timeout());

    let state = AppState {
        pool,
        config: config.clone(),
        workflow,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let game_routes = Router::new()
        .route("/api/v1/games", post(games::create_game))
        .route(
            "/api/v1/games/:invite_id",
            get(games::get_game).delete(games::delete_game),
        )
        .route(
            "/api/v1/games/:invite_id/registrations",
            post(games::join_game),
        )
        .route("/api/v1/assets/:key", get(assets::get_asset))
        .layer(DefaultBodyLimit::max(config.server.max_body_size));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(game_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            config.security.hsts_enabled,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
