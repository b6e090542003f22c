//! Sift Web Server
//!
//! Axum-based REST API for the Sift expense classification engine.
//!
//! Security features:
//! - Bearer API key authentication (secure by default, use --no-auth for
//!   local dev); identity/token issuance is handled by an external
//!   collaborator, this server only validates configured keys
//! - Restrictive CORS policy
//! - Input validation (pagination limits, month format, weight bounds)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sift_core::db::Database;
use sift_core::{EngineConfig, JobRegistry};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys accepted as `Bearer <key>` in the Authorization header.
    /// Issued and rotated by the external auth collaborator.
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Engine tunables (category caps, thresholds, learning rate)
    pub engine: EngineConfig,
    /// Cancellation flags for live auto-tag jobs
    pub jobs: JobRegistry,
}

/// Authentication middleware - validates bearer API keys
///
/// API keys are compared using constant-time comparison to prevent timing
/// attacks.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time comparison
/// to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && provided_bytes.ct_eq(key_bytes).into() {
            return true;
        }
    }
    false
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    create_router_with_engine(db, config, EngineConfig::default())
}

/// Create the application router with explicit engine config (for testing)
pub fn create_router_with_engine(
    db: Database,
    config: ServerConfig,
    engine: EngineConfig,
) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        engine,
        jobs: JobRegistry::new(),
    });

    let api_routes = Router::new()
        // Suggestions and decisions
        .route(
            "/transactions/:id/ai-suggestion",
            get(handlers::get_ai_suggestion),
        )
        .route(
            "/transactions/:id/classify",
            post(handlers::classify_transaction),
        )
        .route(
            "/transactions/pending-classification",
            get(handlers::pending_classification),
        )
        // Feedback learning
        .route(
            "/ai/improve-classification",
            post(handlers::improve_classification),
        )
        // Auto-tag jobs
        .route("/auto-tag", post(handlers::start_auto_tag))
        .route("/auto-tag/:id", get(handlers::get_auto_tag_progress))
        .route("/auto-tag/:id/cancel", post(handlers::cancel_auto_tag))
        // Rules
        .route(
            "/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route("/rules/test", post(handlers::test_rules))
        // Transactions (import stand-in + listing)
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/expense-classification", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }

    // Fail over any jobs left running by a previous process; their
    // persisted progress stays available for resumption.
    match db.recover_interrupted_jobs() {
        Ok(count) if count > 0 => {
            warn!(
                "⚠️  Recovered {} interrupted auto-tag job(s) from previous server session",
                count
            );
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to recover interrupted auto-tag jobs: {}", e);
        }
    }

    let engine = EngineConfig::load()?;
    let app = create_router_with_engine(db, config, engine);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unprocessable(msg: &str) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

/// Map an engine error onto the HTTP taxonomy:
/// NotFound -> 404, NotApplicable -> 422, AlreadyRunning -> 409,
/// InvalidDecision/InvalidData -> 400, everything else -> sanitized 500.
pub fn engine_error(err: sift_core::Error) -> AppError {
    use sift_core::Error as E;
    match err {
        E::NotFound(msg) => AppError::not_found(&msg),
        E::NotApplicable(msg) => AppError::unprocessable(&msg),
        E::AlreadyRunning(msg) => AppError::conflict(&msg),
        E::InvalidDecision(msg) | E::InvalidData(msg) => AppError::bad_request(&msg),
        other => AppError::from(other),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
