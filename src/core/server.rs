//! HTTP server assembly
//!
//! Merges the auth and application routers, adds the health check and the
//! static uploads service, and wraps everything in CORS, compression and
//! request tracing.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::PgPool;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::applications::{ApplicationService, ApplicationsApiState, applications_api_router};
use crate::core::auth::{
    ApiError, AuthApiState, AuthService, MessageResponse, SessionValidator, auth_api_router,
};
use crate::core::db::health_check;

/// Everything the routers need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub application_service: ApplicationService,
    pub sessions: SessionValidator,
    /// Used by the deep health check; absent when running without a database
    pub pool: Option<PgPool>,
}

#[derive(Debug, Default, Deserialize)]
struct PingQuery {
    #[serde(default)]
    deep: bool,
}

/// Build the complete application router
pub fn app_router(state: AppState, cors_origins: &[String]) -> Router {
    let uploads = ServeDir::new(state.application_service.uploads().root());

    let auth_api = auth_api_router(AuthApiState {
        auth_service: state.auth_service,
        sessions: state.sessions.clone(),
    });

    let applications_api = applications_api_router(ApplicationsApiState {
        service: state.application_service,
        sessions: state.sessions,
    });

    Router::new()
        .route("/ping", get(ping_handler).with_state(state.pool))
        .merge(auth_api)
        .merge(applications_api)
        .nest_service("/uploads", uploads)
        .layer(CompressionLayer::new())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured origins. Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// GET /ping, with `?deep=true` also checking the database
async fn ping_handler(State(pool): State<Option<PgPool>>, Query(query): Query<PingQuery>) -> Response {
    if query.deep
        && let Some(pool) = &pool
        && let Err(e) = health_check(pool).await
    {
        tracing::error!("Database health check failed: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new("Database unavailable", "DATABASE_UNAVAILABLE")),
        )
            .into_response();
    }

    Json(MessageResponse::new("pong")).into_response()
}

/// Resolves when Ctrl-C is received
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
