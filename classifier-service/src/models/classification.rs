use serde::{Deserialize, Serialize};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Image received from the `image` multipart field.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            file_name: None,
            content_type: None,
        }
    }

    /// MIME type sent to the provider.
    ///
    /// Trusts an `image/*` content type, then the file extension, and falls
    /// back to JPEG.
    pub fn mime_type(&self) -> &str {
        if let Some(ct) = self.content_type.as_deref() {
            if ct.starts_with("image/") {
                return ct;
            }
        }

        self.file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
                "jpg" | "jpeg" => Some("image/jpeg"),
                "png" => Some("image/png"),
                "webp" => Some("image/webp"),
                "gif" => Some("image/gif"),
                "heic" => Some("image/heic"),
                "heif" => Some("image/heif"),
                _ => None,
            })
            .unwrap_or(DEFAULT_IMAGE_MIME)
    }

    /// Suffix for the staged temporary file.
    pub fn file_suffix(&self) -> &'static str {
        match self.mime_type() {
            "image/png" => ".png",
            "image/webp" => ".webp",
            "image/gif" => ".gif",
            "image/heic" => ".heic",
            "image/heif" => ".heif",
            _ => ".jpeg",
        }
    }
}

/// Successful classification envelope. `response` is the model text, trimmed
/// and otherwise untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResponse {
    pub response: String,
}
