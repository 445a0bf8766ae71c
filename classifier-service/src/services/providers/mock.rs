//! Mock provider implementation for testing.

use super::{ProviderError, UploadedFile, VisionProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const DEFAULT_MOCK_RESPONSE: &str = "no";

/// Mock vision provider with scripted generation outcomes.
///
/// Each `generate` call pops the next scripted outcome; once the script is
/// exhausted it answers `"no"`. Calls and staged paths are recorded so tests
/// can assert on retries and temp-file cleanup.
#[derive(Default)]
pub struct MockVisionProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    upload_error: Mutex<Option<ProviderError>>,
    panic_on_generate: bool,
    upload_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    uploaded_paths: Mutex<Vec<PathBuf>>,
    prompts: Mutex<Vec<String>>,
}

impl MockVisionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue generation outcomes in call order.
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Fail the upload step with `error`.
    pub fn failing_upload(error: ProviderError) -> Self {
        Self {
            upload_error: Mutex::new(Some(error)),
            ..Self::default()
        }
    }

    /// Panic inside `generate`, simulating an unexpected fault.
    pub fn panicking() -> Self {
        Self {
            panic_on_generate: true,
            ..Self::default()
        }
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Paths of the staged files handed to `upload_file`.
    pub fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.uploaded_paths
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }

    /// Prompts received by `generate`, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<UploadedFile, ProviderError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut paths) = self.uploaded_paths.lock() {
            paths.push(path.to_path_buf());
        }

        if !path.exists() {
            return Err(ProviderError::InvalidRequest(format!(
                "Staged file {} does not exist",
                path.display()
            )));
        }

        if let Some(err) = self.upload_error.lock().ok().and_then(|mut e| e.take()) {
            return Err(err);
        }

        Ok(UploadedFile {
            name: "files/mock".to_string(),
            uri: "mock://files/mock".to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate(&self, _file: &UploadedFile, prompt: &str) -> Result<String, ProviderError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.panic_on_generate {
            panic!("mock provider fault");
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Ok(DEFAULT_MOCK_RESPONSE.to_string()))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
