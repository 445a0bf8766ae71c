use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_UPLOAD_BASE: &str = "https://generativelanguage.googleapis.com/upload";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
/// Default request body limit (20MB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub retry: RetrySettings,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    /// Base URL for model calls (e.g. https://generativelanguage.googleapis.com)
    pub api_base: String,
    /// Base URL for media uploads
    pub upload_base: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Vision-capable model used for classification (e.g., gemini-1.5-flash)
    pub vision_model: String,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Generation attempts including the first one
    pub max_attempts: u32,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

impl ClassifierConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        // API_KEY is the primary name; GOOGLE_API_KEY is accepted as a fallback.
        let api_key = match env::var("API_KEY").or_else(|_| env::var("GOOGLE_API_KEY")) {
            Ok(key) => key,
            Err(_) => get_env("API_KEY", Some(""), is_prod)?,
        };

        Ok(ClassifierConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: Secret::new(api_key),
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_API_BASE), is_prod)?,
                upload_base: get_env("GEMINI_UPLOAD_BASE", Some(DEFAULT_UPLOAD_BASE), is_prod)?,
            },
            models: ModelConfig {
                vision_model: get_env("GENAI_MODEL", Some(DEFAULT_MODEL), is_prod)?,
            },
            retry: RetrySettings {
                max_attempts: parse_env("CLASSIFY_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?.max(1),
                delay: Duration::from_millis(parse_env(
                    "CLASSIFY_RETRY_DELAY_MS",
                    DEFAULT_RETRY_DELAY_MS,
                )?),
            },
            upload: UploadConfig {
                max_upload_bytes: parse_env("CLASSIFY_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
        })
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.map_or(true, str::is_empty) {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Numeric setting; unset falls back to the default, a malformed value is an error.
fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value {:?}: {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classification_policy() {
        let retry = RetrySettings::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay, Duration::from_secs(2));
        assert_eq!(UploadConfig::default().max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_get_env_uses_default_outside_prod() {
        let value = get_env("CLASSIFIER_TEST_UNSET_VARIABLE", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_get_env_requires_secret_in_prod() {
        let result = get_env("CLASSIFIER_TEST_UNSET_SECRET", Some(""), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_parse_env_falls_back_when_unset() {
        assert_eq!(parse_env("CLASSIFIER_TEST_UNSET_NUMBER", 7u32).unwrap(), 7);
    }

    #[test]
    fn test_parse_env_reads_set_value() {
        env::set_var("CLASSIFIER_TEST_VALID_NUMBER", " 5 ");
        assert_eq!(parse_env("CLASSIFIER_TEST_VALID_NUMBER", 7u32).unwrap(), 5);
        env::remove_var("CLASSIFIER_TEST_VALID_NUMBER");
    }

    #[test]
    fn test_parse_env_rejects_malformed_value() {
        env::set_var("CLASSIFIER_TEST_MALFORMED_NUMBER", "abc");
        let result = parse_env("CLASSIFIER_TEST_MALFORMED_NUMBER", 7u32);
        env::remove_var("CLASSIFIER_TEST_MALFORMED_NUMBER");

        match result {
            Err(AppError::ConfigError(e)) => {
                assert!(e.to_string().contains("CLASSIFIER_TEST_MALFORMED_NUMBER"))
            }
            other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
