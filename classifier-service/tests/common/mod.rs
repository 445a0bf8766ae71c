#![allow(dead_code)]

use classifier_service::config::{
    ClassifierConfig, GoogleConfig, ModelConfig, RetrySettings, UploadConfig,
};
use classifier_service::models::LabelSet;
use classifier_service::services::providers::mock::MockVisionProvider;
use classifier_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockVisionProvider>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(provider: MockVisionProvider) -> Self {
        Self::spawn_with_upload(provider, UploadConfig::default()).await
    }

    pub async fn spawn_with_upload(provider: MockVisionProvider, upload: UploadConfig) -> Self {
        let config = ClassifierConfig {
            common: CoreConfig { port: 0 }, // Random port
            google: GoogleConfig {
                api_key: Secret::new("test-api-key".to_string()),
                api_base: "http://127.0.0.1:9".to_string(),
                upload_base: "http://127.0.0.1:9".to_string(),
            },
            models: ModelConfig {
                vision_model: "gemini-1.5-flash".to_string(),
            },
            retry: RetrySettings {
                max_attempts: 3,
                delay: Duration::from_millis(5),
            },
            upload,
        };

        let provider = Arc::new(provider);
        let app = Application::build_with_provider(config, provider.clone(), LabelSet::default())
            .await
            .expect("Failed to build application");
        let port = app.port();

        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            provider,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap(),
        }
    }

    pub async fn classify(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/api/classify_dress", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Every staged file handed to the provider must be gone.
    pub fn assert_no_staged_files_left(&self) {
        let paths = self.provider.uploaded_paths();
        assert!(!paths.is_empty(), "provider never received a staged file");
        for path in paths {
            assert!(!path.exists(), "staged file {} left behind", path.display());
        }
    }
}

pub fn image_form() -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10])
            .file_name("dress.jpg")
            .mime_str("image/jpeg")
            .unwrap(),
    )
}
