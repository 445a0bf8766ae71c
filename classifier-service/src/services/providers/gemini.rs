//! Gemini vision provider implementation.
//!
//! Uploads images through the Gemini Files API and asks the model about them
//! with `generateContent`.

use super::{ProviderError, UploadedFile, VisionProvider};
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

/// Gemini REST API version.
const GEMINI_API_VERSION: &str = "v1beta";

/// Header carrying the API key. Keeps the credential out of URLs, which
/// reqwest includes in its error messages.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub upload_base: String,
}

/// Gemini vision provider.
pub struct GeminiVisionProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiVisionProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            GEMINI_API_VERSION,
            self.config.model,
            method
        )
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/files",
            self.config.upload_base.trim_end_matches('/'),
            GEMINI_API_VERSION
        )
    }

    /// Multipart/related body: JSON metadata part followed by the raw bytes.
    fn multipart_body(display_name: &str, mime_type: &str, data: &[u8], boundary: &str) -> Vec<u8> {
        let mut body = Vec::with_capacity(data.len() + 512);

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        let metadata = json!({ "file": { "display_name": display_name } });
        body.extend_from_slice(metadata.to_string().as_bytes());
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }
}

/// Stringify a transport error without the request URL.
fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::NetworkError(e.without_url().to_string())
}

/// Map non-success statuses to provider errors. 429 is the only retryable one.
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        return Err(ProviderError::RateLimited(format!(
            "Gemini API error {}: {}",
            status, error_text
        )));
    }

    if status.as_u16() == 400 {
        return Err(ProviderError::InvalidRequest(format!(
            "Gemini API error {}: {}",
            status, error_text
        )));
    }

    Err(ProviderError::ApiError(format!(
        "Gemini API error {}: {}",
        status, error_text
    )))
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<UploadedFile, ProviderError> {
        let data = tokio::fs::read(path).await?;
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("image-{}", Uuid::new_v4()));

        let boundary = format!("upload-{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&display_name, mime_type, &data, &boundary);

        tracing::debug!(
            display_name = %display_name,
            mime_type = %mime_type,
            size = data.len(),
            "Uploading image to Gemini Files API"
        );

        let response = self
            .client
            .post(self.upload_url())
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .header("X-Goog-Upload-Protocol", "multipart")
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(network_error)?;

        let response = check_status(response).await?;

        let uploaded: UploadFileResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::ApiError(format!(
                    "Failed to parse upload response: {}",
                    e.without_url()
                ))
            })?;

        let file = uploaded.file;
        Ok(UploadedFile {
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn generate(&self, file: &UploadedFile, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::FileData {
                        file_data: FileData {
                            mime_type: file.mime_type.clone(),
                            file_uri: file.uri.clone(),
                        },
                    },
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            file = %file.name,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let response = check_status(response).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::ApiError(format!("Failed to parse response: {}", e.without_url()))
            })?;

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            if api_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .is_some()
            {
                return Err(ProviderError::ContentFiltered);
            }
            return Err(ProviderError::EmptyResponse);
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::ContentFiltered);
        }

        // Candidate text is the concatenation of its text parts.
        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text),
                _ => None,
            })
            .collect();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadFileResponse {
    file: FileMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    name: String,
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
}
