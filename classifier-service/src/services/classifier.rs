//! Classification pipeline: stage the image, upload it, ask the model.

use crate::config::RetrySettings;
use crate::models::{ImageUpload, LabelSet};
use crate::services::prompt::build_classification_prompt;
use crate::services::providers::{ProviderError, UploadedFile, VisionProvider};
use service_core::retry::{retry_call, RetryConfig};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Failed to stage image: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Classifies uploaded images against a fixed label set.
///
/// The prompt is rendered once from the label set and reused for every call.
pub struct Classifier {
    provider: Arc<dyn VisionProvider>,
    labels: LabelSet,
    prompt: String,
    retry: RetryConfig,
}

impl Classifier {
    pub fn new(provider: Arc<dyn VisionProvider>, labels: LabelSet, retry: &RetrySettings) -> Self {
        let prompt = build_classification_prompt(&labels);
        Self {
            provider,
            labels,
            prompt,
            retry: RetryConfig::fixed(retry.max_attempts.saturating_sub(1), retry.delay),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Classify one image and return the model's trimmed answer.
    ///
    /// The image is staged in a temporary file that is removed on every exit
    /// path; a failed removal is logged and otherwise ignored.
    pub async fn classify(&self, image: &ImageUpload) -> Result<String, ClassifyError> {
        let staged = stage_image(image).await?;

        let result = self.classify_staged(staged.path(), image.mime_type()).await;

        let path = staged.path().to_path_buf();
        if let Err(e) = staged.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged image");
        }

        result
    }

    async fn classify_staged(&self, path: &Path, mime_type: &str) -> Result<String, ClassifyError> {
        let uploaded = self.provider.upload_file(path, mime_type).await?;

        tracing::debug!(file = %uploaded.name, "Image uploaded to provider");

        let text = self.generate_with_retry(&uploaded).await?;
        Ok(text.trim().to_string())
    }

    /// Run generation, retrying only on provider rate limits.
    async fn generate_with_retry(&self, file: &UploadedFile) -> Result<String, ProviderError> {
        let provider = &self.provider;
        let prompt = self.prompt.as_str();

        retry_call(&self.retry, "generate_classification", move || {
            provider.generate(file, prompt)
        })
        .await
    }
}

/// Write the upload to a fresh temporary file owned by the caller.
async fn stage_image(image: &ImageUpload) -> Result<NamedTempFile, ClassifyError> {
    let staged = tempfile::Builder::new()
        .prefix("classify-")
        .suffix(image.file_suffix())
        .tempfile()
        .map_err(ClassifyError::Staging)?;

    tokio::fs::write(staged.path(), &image.data)
        .await
        .map_err(ClassifyError::Staging)?;

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockVisionProvider;
    use std::time::Duration;

    fn retry_settings() -> RetrySettings {
        RetrySettings {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    fn classifier(provider: Arc<MockVisionProvider>) -> Classifier {
        Classifier::new(provider, LabelSet::default(), &retry_settings())
    }

    fn image() -> ImageUpload {
        ImageUpload::new(vec![0xff, 0xd8, 0xff, 0xe0])
    }

    fn rate_limited() -> Result<String, ProviderError> {
        Err(ProviderError::RateLimited("Gemini API error 429".to_string()))
    }

    fn assert_staged_files_removed(provider: &MockVisionProvider) {
        let paths = provider.uploaded_paths();
        assert!(!paths.is_empty());
        for path in paths {
            assert!(!path.exists(), "staged file {} left behind", path.display());
        }
    }

    #[tokio::test]
    async fn test_returns_trimmed_text_verbatim() {
        let provider = Arc::new(MockVisionProvider::with_responses([Ok(
            "  yes\n[\"maxi\", \"floral\"]\n\n".to_string(),
        )]));

        let text = classifier(provider.clone()).classify(&image()).await.unwrap();

        assert_eq!(text, "yes\n[\"maxi\", \"floral\"]");
        assert_eq!(provider.generate_calls(), 1);
        assert_staged_files_removed(&provider);
    }

    #[tokio::test]
    async fn test_retries_rate_limit_twice_then_succeeds() {
        let provider = Arc::new(MockVisionProvider::with_responses([
            rate_limited(),
            rate_limited(),
            Ok("no".to_string()),
        ]));

        let text = classifier(provider.clone()).classify(&image()).await.unwrap();

        assert_eq!(text, "no");
        assert_eq!(provider.upload_calls(), 1);
        assert_eq!(provider.generate_calls(), 3);
        assert_staged_files_removed(&provider);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_rate_limit() {
        let provider = Arc::new(MockVisionProvider::with_responses([
            rate_limited(),
            rate_limited(),
            rate_limited(),
            Ok("unreachable".to_string()),
        ]));

        let err = classifier(provider.clone())
            .classify(&image())
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Provider(ProviderError::RateLimited(_))));
        assert_eq!(provider.generate_calls(), 3);
        assert_staged_files_removed(&provider);
    }

    #[tokio::test]
    async fn test_non_rate_limit_failure_is_not_retried() {
        let provider = Arc::new(MockVisionProvider::with_responses([
            Err(ProviderError::ApiError("Gemini API error 500".to_string())),
            Ok("unreachable".to_string()),
        ]));

        let err = classifier(provider.clone())
            .classify(&image())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error: Gemini API error 500");
        assert_eq!(provider.generate_calls(), 1);
        assert_staged_files_removed(&provider);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_generation() {
        let provider = Arc::new(MockVisionProvider::failing_upload(
            ProviderError::NetworkError("connection reset".to_string()),
        ));

        let err = classifier(provider.clone())
            .classify(&image())
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Provider(ProviderError::NetworkError(_))));
        assert_eq!(provider.generate_calls(), 0);
        assert_staged_files_removed(&provider);
    }

    #[tokio::test]
    async fn test_staged_file_uses_image_suffix() {
        let provider = Arc::new(MockVisionProvider::new());
        let png = ImageUpload {
            data: vec![0x89, b'P', b'N', b'G'],
            file_name: Some("dress.png".to_string()),
            content_type: Some("image/png".to_string()),
        };

        classifier(provider.clone()).classify(&png).await.unwrap();

        let paths = provider.uploaded_paths();
        assert_eq!(paths[0].extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[tokio::test]
    async fn test_prompt_is_built_from_injected_labels() {
        let provider = Arc::new(MockVisionProvider::new());
        let classifier = Classifier::new(
            provider.clone(),
            LabelSet::new(["gown", "tuxedo"]),
            &retry_settings(),
        );

        classifier.classify(&image()).await.unwrap();

        assert_eq!(classifier.labels().len(), 2);
        assert!(provider.prompts()[0].contains("gown, tuxedo"));
    }
}
