//! Application startup and lifecycle management.

use crate::config::DocQaConfig;
use crate::handlers;
use crate::services::metrics::http_metrics_middleware;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::{InMemorySessionStore, SessionStore};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    make_request_span, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Room for multipart framing and the query field on top of the document itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DocQaConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn new(
        config: DocQaConfig,
        sessions: Arc<dyn SessionStore>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            text_provider,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.limits.max_document_bytes + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .route(
            "/upload-and-query",
            post(handlers::upload_and_query).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/query-document", post(handlers::query_document))
        .route("/generate-mcq", post(handlers::generate_mcq));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api", api)
        .route_layer(from_fn(http_metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini provider described by `config`.
    pub async fn build(config: DocQaConfig) -> Result<Self, AppError> {
        config.validate()?;

        let gemini = GeminiTextProvider::new(GeminiConfig::from(&config.gemini)).map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::anyhow!(e.to_string()))
        })?;

        tracing::info!(
            model = %config.gemini.model,
            backend = ?config.gemini.backend,
            "Initialized Gemini text provider"
        );

        Self::build_with_provider(config, Arc::new(gemini)).await
    }

    /// Build the application around an existing provider (tests, local mocks).
    pub async fn build_with_provider(
        config: DocQaConfig,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let addr: SocketAddr = config.common.socket_addr();
        let state = AppState::new(config, sessions, text_provider);

        // Port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("docqa-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until the process receives Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
