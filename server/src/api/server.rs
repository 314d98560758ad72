//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::auth::{AuthState, require_api_key};
use super::middleware;
use super::routes::{health, issues, logs, metrics};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::IssueRepository;
use crate::data::logs::LogService;

/// Assemble every route.
///
/// Issue and metrics routes require the API key; the Logger API checks its
/// own auth code and health probes are open.
pub fn build_router(
    issues: Arc<dyn IssueRepository>,
    logs: Arc<LogService>,
    api_key: Option<&str>,
) -> Router {
    let auth = AuthState::new(api_key);

    let protected = issues::routes(issues.clone())
        .merge(metrics::routes(issues.clone()))
        .route_layer(axum::middleware::from_fn_with_state(auth, require_api_key));

    Router::new()
        .merge(protected)
        .merge(logs::routes(logs.clone()))
        .nest("/health", health::routes(issues, logs))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();
        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        let addr = SocketAddr::new(
            host.parse()
                .with_context(|| format!("Invalid host address: {}", host))?,
            port,
        );

        let router = build_router(
            app.issues.clone(),
            app.logs.clone(),
            app.config.auth.key.as_deref(),
        );

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!(address = %addr, "Listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}
