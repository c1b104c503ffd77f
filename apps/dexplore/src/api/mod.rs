//! # dexplore HTTP API Module
//!
//! Reference exploration service over HTTP using axum. Explorations live in
//! memory, keyed by a client-chosen id, and advance through the pure core
//! transition function against the server's knowledge base.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/knowledge` - Knowledge base dump
//! - `GET /api/component-types` - DE and SI component type catalog
//! - `GET /api/explorations/{id}` - Current snapshot
//! - `DELETE /api/explorations/{id}` - Discard an exploration
//! - `POST /api/explorations/{id}/start` - Start an exploration
//! - `POST /api/explorations/{id}/{situation|problem|intention|decompose|solution}` - Submit one event
//! - `GET /api/explorations/{id}/render` - Rendered DE graph
//! - `POST /api/convert` - Not hosted here (501)
//!
//! ## Security Configuration
//!
//! - `cors_origins` / `DEXPLORE_CORS_ORIGINS`: Comma-separated origins, or "*" (default: localhost only)
//! - `rate_limit` / `DEXPLORE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `api_key` / `DEXPLORE_API_KEY`: If set, requires Bearer token authentication
//! - `max_explorations` / `DEXPLORE_MAX_EXPLORATIONS`: Explorations held at once; starting
//!   a new one when full evicts a completed exploration, or fails if none is completed

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{ApiKey, keys_match};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ApiError, ComponentType, ComponentTypesResponse, DecomposeRequest, ErrorResponse,
    HealthResponse, IntentionRequest, KnowledgeResponse, ProblemRequest, SituationRequest,
    SolutionRequest, StartRequest, status_for,
};

use crate::config::{Config, DEFAULT_MAX_EXPLORATIONS};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use dexplore_core::{DexploreError, ExplorationState, KnowledgeBase};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: every hosted exploration plus the knowledge base.
#[derive(Clone)]
pub struct AppState {
    pub explorations: Arc<RwLock<BTreeMap<String, ExplorationState>>>,
    pub knowledge: Arc<KnowledgeBase>,
    pub max_explorations: usize,
}

impl AppState {
    #[must_use]
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self {
            explorations: Arc::new(RwLock::new(BTreeMap::new())),
            knowledge: Arc::new(knowledge),
            max_explorations: DEFAULT_MAX_EXPLORATIONS,
        }
    }

    #[must_use]
    pub fn with_max_explorations(mut self, max: usize) -> Self {
        self.max_explorations = max;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `cors_origins`.
///
/// - `"*"`: allows all origins
/// - unset: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8000",
    ]
    .into_iter()
    .filter_map(|o| o.parse().ok())
    .collect();
    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if a key is configured)
pub fn create_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/knowledge", get(handlers::knowledge_handler))
        .route("/api/component-types", get(handlers::component_types_handler))
        .route(
            "/api/explorations/{id}",
            get(handlers::get_exploration_handler).delete(handlers::delete_exploration_handler),
        )
        .route("/api/explorations/{id}/start", post(handlers::start_handler))
        .route(
            "/api/explorations/{id}/situation",
            post(handlers::situation_handler),
        )
        .route("/api/explorations/{id}/problem", post(handlers::problem_handler))
        .route(
            "/api/explorations/{id}/intention",
            post(handlers::intention_handler),
        )
        .route(
            "/api/explorations/{id}/decompose",
            post(handlers::decompose_handler),
        )
        .route(
            "/api/explorations/{id}/solution",
            post(handlers::solution_handler),
        )
        .route("/api/explorations/{id}/render", get(handlers::render_handler))
        .route("/api/convert", post(handlers::convert_handler));

    if let Some(key) = config.api_key() {
        tracing::info!("API key authentication enabled");
        let key: ApiKey = Arc::from(key);
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set DEXPLORE_API_KEY to enable authentication."
        );
    }

    if let Some(limiter) = create_rate_limiter(config.rate_limit) {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config.cors_origins.as_deref()))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState, config: &Config) -> Result<(), DexploreError> {
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DexploreError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("dexplore HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DexploreError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
