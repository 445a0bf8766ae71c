//! Vision model provider abstraction.
//!
//! The classifier only needs two calls from a provider: store an image and
//! generate text about a stored image. Keeping that surface narrow lets the
//! retry policy run against the mock provider in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use service_core::retry::Retryable;
use std::path::Path;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Retryable for ProviderError {
    /// Only provider backpressure (HTTP 429) is worth repeating.
    fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

/// Handle to an image stored with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Provider resource name (e.g. `files/abc123`).
    pub name: String,

    /// URI referenced from generation requests.
    pub uri: String,

    /// MIME type recorded by the provider.
    pub mime_type: String,
}

/// Trait for multimodal providers that answer prompts about images (e.g., Gemini).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Upload the file at `path` to the provider's file storage.
    async fn upload_file(&self, path: &Path, mime_type: &str)
        -> Result<UploadedFile, ProviderError>;

    /// Generate a text answer for `prompt` about the uploaded file.
    async fn generate(&self, file: &UploadedFile, prompt: &str) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
