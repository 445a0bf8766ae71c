//! Application startup and lifecycle management.

use crate::config::ClassifierConfig;
use crate::handlers;
use crate::models::LabelSet;
use crate::services::providers::gemini::{GeminiConfig, GeminiVisionProvider};
use crate::services::providers::VisionProvider;
use crate::services::Classifier;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ClassifierConfig,
    pub classifier: Arc<Classifier>,
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    /// Build the application with the Gemini provider and the default labels.
    pub async fn build(config: ClassifierConfig) -> Result<Self, AppError> {
        let provider = GeminiVisionProvider::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.vision_model.clone(),
            api_base: config.google.api_base.clone(),
            upload_base: config.google.upload_base.clone(),
        })
        .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        if let Err(e) = provider.health_check().await {
            tracing::warn!(error = %e, "Gemini provider is not ready; requests will fail");
        }

        tracing::info!(
            model = %config.models.vision_model,
            "Initialized Gemini vision provider"
        );

        Self::build_with_provider(config, Arc::new(provider), LabelSet::default()).await
    }

    /// Build the application around any provider and label set.
    pub async fn build_with_provider(
        config: ClassifierConfig,
        provider: Arc<dyn VisionProvider>,
        labels: LabelSet,
    ) -> Result<Self, AppError> {
        tracing::info!(labels = labels.len(), "Loaded classification labels");

        let classifier = Classifier::new(provider, labels, &config.retry);
        let state = AppState {
            config: config.clone(),
            classifier: Arc::new(classifier),
        };

        let app = router(state);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// Build the HTTP router: health, classification, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.upload.max_upload_bytes;

    let health_routes = Router::new()
        .route("/api/health", get(handlers::health_check))
        .layer(CatchPanicLayer::custom(handlers::health::unhealthy_response));

    let classify_routes = Router::new()
        .route("/api/classify_dress", post(handlers::classify_dress))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::custom(handlers::classify::panic_response))
        .with_state(state);

    health_routes
        .merge(classify_routes)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
