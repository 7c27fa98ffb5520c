use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::services::{LocationUpdateService, LogPushSender, PushSender};
use persistence::repositories::{PushSubscriptionRepository, UserRepository, ZoneRepository};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{auth, health, locations, push, reminders};
use crate::services::auth::{jwt_config_from, AuthService};
use crate::services::WebPushSender;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub auth: AuthService,
    pub zones: ZoneRepository,
    pub subscriptions: PushSubscriptionRepository,
    pub location_updates: Arc<LocationUpdateService>,
}

/// Builds the router with the push sender chosen by configuration.
///
/// With push disabled, notifications are only logged.
pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    let sender: Arc<dyn PushSender> = if config.push.enabled {
        Arc::new(WebPushSender::new(&config.push)?)
    } else {
        tracing::warn!("Web Push disabled, notifications will only be logged");
        Arc::new(LogPushSender)
    };

    create_app_with_sender(config, pool, sender)
}

/// Builds the router around an explicit push sender.
pub fn create_app_with_sender(
    config: Config,
    pool: PgPool,
    sender: Arc<dyn PushSender>,
) -> anyhow::Result<Router> {
    let config = Arc::new(config);
    let jwt = Arc::new(jwt_config_from(&config.jwt)?);

    let users = UserRepository::new(pool.clone());
    let zones = ZoneRepository::new(pool.clone());
    let subscriptions = PushSubscriptionRepository::new(pool.clone());

    let location_updates = Arc::new(LocationUpdateService::new(
        Arc::new(zones.clone()),
        Arc::new(subscriptions.clone()),
        sender,
    ));

    let state = AppState {
        pool,
        config: config.clone(),
        jwt: jwt.clone(),
        auth: AuthService::new(users, jwt),
        zones,
        subscriptions,
        location_updates,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
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

    // Authenticated through the UserAuth extractor in each handler.
    let user_routes = Router::new()
        .route(
            "/api/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route("/api/reminders/:id", delete(reminders::delete_reminder))
        .route("/api/location/update", post(locations::update_location))
        .route("/api/push/subscribe", post(push::subscribe))
        .route("/api/push/test", post(push::send_test));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/metrics", get(metrics_handler));

    let router = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state);

    Ok(router)
}
