//! StudyGate Auth Server
//!
//! Production server for the authentication REST APIs:
//! - Login / logout with session cookies
//! - Google federated login
//! - Registration and role assignment
//! - Session status
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SG_API_PORT` | `8080` | HTTP API port |
//! | `SG_METRICS_PORT` | `9090` | Metrics/health port |
//! | `SG_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `SG_MONGO_DB` | `studygate` | MongoDB database name |
//! | `SG_SESSION_COOKIE_NAME` | `sg_session` | Session cookie name |
//! | `SG_SESSION_COOKIE_SECURE` | `false` | Set the `Secure` attribute on the cookie |
//! | `SG_SESSION_SAME_SITE` | `Lax` | Cookie `SameSite` policy (`Strict`, `Lax`, `None`) |
//! | `SG_SESSION_TTL_SECS` | `28800` | Session lifetime in seconds |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | - | Set to `json` for structured log output |

use std::sync::Arc;
use axum::{
    routing::get,
    response::Json,
    Router,
};
use utoipa_axum::router::OpenApiRouter;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use anyhow::Result;
use tracing::{info, warn};
use tokio::{signal, net::TcpListener};
use utoipa_swagger_ui::SwaggerUi;

use sg_identity::shared::indexes::initialize_indexes;
use sg_identity::{
    auth_router, AuthState, FederatedSyncService, PasswordService, SessionRepository,
    UserRepository,
};


fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Server configuration, read once at startup
struct ServerConfig {
    api_port: u16,
    metrics_port: u16,
    mongo_url: String,
    mongo_db: String,
    session_cookie_name: String,
    session_cookie_secure: bool,
    session_same_site: String,
    session_ttl_secs: i64,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            api_port: env_or_parse("SG_API_PORT", 8080),
            metrics_port: env_or_parse("SG_METRICS_PORT", 9090),
            mongo_url: env_or("SG_MONGO_URL", "mongodb://localhost:27017"),
            mongo_db: env_or("SG_MONGO_DB", "studygate"),
            session_cookie_name: env_or("SG_SESSION_COOKIE_NAME", "sg_session"),
            session_cookie_secure: env_or_parse("SG_SESSION_COOKIE_SECURE", false),
            session_same_site: env_or("SG_SESSION_SAME_SITE", "Lax"),
            session_ttl_secs: env_or_parse("SG_SESSION_TTL_SECS", 28800),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    sg_common::logging::init_logging("sg-auth-server");

    info!("Starting StudyGate Auth Server");

    // Configuration from environment
    let config = ServerConfig::from_env();

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", config.mongo_url, config.mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_url).await?;
    let db = mongo_client.database(&config.mongo_db);

    // Index creation failures are logged, not fatal
    if let Err(e) = initialize_indexes(&db).await {
        warn!("Index initialization failed: {}", e);
    }

    // Initialize repositories and services
    let user_repo = Arc::new(UserRepository::new(&db));
    let session_repo = Arc::new(SessionRepository::new(&db));
    let password_service = Arc::new(PasswordService::default());
    let federated_sync = Arc::new(FederatedSyncService::new(user_repo.clone()));
    info!("Repositories and services initialized");

    let auth_state = AuthState::new(user_repo, session_repo, password_service, federated_sync)
        .with_session_cookie_settings(
            &config.session_cookie_name,
            config.session_cookie_secure,
            &config.session_same_site,
            config.session_ttl_secs,
        );

    // Build auth API router using OpenApiRouter for auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/auth", auth_router(auth_state))
        .split_for_parts();

    // Update OpenAPI info
    openapi.info.title = "StudyGate Auth API".to_string();
    openapi.info.version = "1.0.0".to_string();
    openapi.info.description = Some("REST APIs for login, registration, and role assignment".to_string());

    let app = Router::new()
        .merge(router)
        // OpenAPI / Swagger UI with auto-collected paths
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", config.api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    // Start metrics server
    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
    info!("Metrics server listening on http://{}/metrics", metrics_addr);

    let metrics_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    let metrics_listener = TcpListener::bind(&metrics_addr).await?;
    let metrics_task = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_app).await.unwrap();
    });

    info!("StudyGate Auth Server started");
    info!("Press Ctrl+C to shutdown");

    // Wait for shutdown
    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();
    metrics_task.abort();

    info!("StudyGate Auth Server shutdown complete");
    Ok(())
}

async fn metrics_handler() -> &'static str {
    "# HELP sg_auth_up Auth server is up\n# TYPE sg_auth_up gauge\nsg_auth_up 1\n"
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
