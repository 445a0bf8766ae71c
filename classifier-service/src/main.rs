use classifier_service::config::ClassifierConfig;
use classifier_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("classifier-service", "info", otlp_endpoint.as_deref());

    let config = ClassifierConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    tracing::info!(port = app.port(), "Classifier service started");

    app.run_until_stopped().await
}
