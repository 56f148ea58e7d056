//! Axum server setup
//!
//! Server skeleton with:
//! - CORS for the configured frontend origins
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;

/// Origin of the web frontend's dev server
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:4200";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    pub bind_addr: SocketAddr,

    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,

    /// Allow any origin (default: false)
    ///
    /// WARNING: Setting this to true allows any origin.
    /// Only use for development.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            cors_permissive: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

/// Build the application router.
///
/// Fails only if a configured CORS origin is not a valid header value.
pub fn build_router(pool: PgPool, config: &ServerConfig) -> Result<Router, ServerError> {
    let state = AppState { pool };

    let app = Router::new()
        .merge(routes::health::router())
        .nest(
            "/api",
            Router::new()
                .merge(routes::todos::router())
                .merge(routes::groups::router()),
        )
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    Ok(app)
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ServerError> {
    if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ServerError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Credentials rule out wildcards, so mirror the request instead
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// let config = ServerConfig::default();
/// run_server(pool, config).await?;
/// ```
pub async fn run_server(pool: PgPool, config: ServerConfig) -> Result<(), ServerError> {
    let app = build_router(pool, &config)?;

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only requests rejected
    /// before reaching the store may be sent through it.
    fn offline_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/todoctl_offline")
            .unwrap();
        build_router(pool, &ServerConfig::default()).unwrap()
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.cors_origins, vec!["http://localhost:4200"]);
        assert!(!config.cors_permissive);
    }

    #[tokio::test]
    async fn rejects_invalid_origin() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/todoctl_offline")
            .unwrap();
        let config = ServerConfig {
            cors_origins: vec!["bad\norigin".into()],
            ..Default::default()
        };
        assert!(matches!(
            build_router(pool, &config),
            Err(ServerError::InvalidOrigin(_))
        ));
    }

    #[tokio::test]
    async fn root_endpoint() {
        let (status, body) = send(offline_app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Todo API is running");
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(offline_app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_todo_without_title_is_rejected() {
        let (status, body) = send(
            offline_app(),
            Method::POST,
            "/api/todos",
            Some(r#"{"description": "no title"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_body");
    }

    #[tokio::test]
    async fn create_todo_with_wrong_type_is_rejected() {
        let (status, _) = send(
            offline_app(),
            Method::POST,
            "/api/todos",
            Some(r#"{"title": "x", "completed": "yes"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) =
            send(offline_app(), Method::POST, "/api/groups", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_body");
    }

    #[tokio::test]
    async fn blank_title_is_validation_error() {
        let (status, body) = send(
            offline_app(),
            Method::POST,
            "/api/todos",
            Some(r#"{"title": "   "}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "title cannot be empty");
    }

    #[tokio::test]
    async fn nul_character_is_validation_error() {
        let (status, body) = send(
            offline_app(),
            Method::POST,
            "/api/todos",
            Some(r#"{"title": "a\u0000b"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "title: must not contain NUL characters");

        let (status, body) = send(
            offline_app(),
            Method::POST,
            "/api/groups",
            Some(r#"{"name": "ok", "color": "x\u0000"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn create_group_without_name_is_rejected() {
        let (status, _) =
            send(offline_app(), Method::POST, "/api/groups", Some(r#"{"color": "red"}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn null_required_field_in_update_is_rejected() {
        let (status, body) = send(
            offline_app(),
            Method::PUT,
            "/api/todos/1",
            Some(r#"{"completed": null}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "completed cannot be null");
    }

    #[tokio::test]
    async fn non_numeric_id_is_rejected() {
        let (status, body) = send(offline_app(), Method::GET, "/api/groups/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(offline_app(), Method::DELETE, "/api/todos/0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/todos")
            .body(Body::from(r#"{"title": "x"}"#))
            .unwrap();
        let response = offline_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn cors_preflight_allows_frontend_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/todos")
            .header(header::ORIGIN, DEFAULT_CORS_ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();
        let response = offline_app().oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            DEFAULT_CORS_ORIGIN
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
