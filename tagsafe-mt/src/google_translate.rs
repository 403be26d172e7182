//! Google Translate API provider for machine translation
//!
//! This module integrates with Google Translate API v2.
//!
//! # Authentication
//!
//! The provider loads the API key from the `GOOGLE_TRANSLATE_API_KEY`
//! environment variable. Obtain a key from:
//! https://console.cloud.google.com/
//!
//! # Example
//!
//! ```ignore
//! use tagsafe_mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!
//!     let result = provider.translate("Hello, world!", "auto", "zh-TW").await?;
//!     println!("{}", result);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::{
    MachineTranslator, is_auto_locale, normalize_locale, validate_locale, validate_target_locale,
};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Google Translate API v2 provider
///
/// Sends one text per request; the pipeline does the chunking.
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL for Google Translate API
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Maximum characters per string (30K per Google Translate API limits)
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Create a new GoogleTranslateProvider with an explicit API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If API key is empty or HTTP client creation fails
    pub fn new(api_key: String) -> MtResult<Self> {
        Self::with_timeout(api_key, Duration::from_secs(30))
    }

    /// Create a provider whose HTTP client gives up after `timeout`
    pub fn with_timeout(api_key: String, timeout: Duration) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::Config("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MtError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a GoogleTranslateProvider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| MtError::Config(format!("{} environment variable not set", API_KEY_ENV)))?;

        Self::new(api_key)
    }

    /// Point the provider at another endpoint (a proxy or a local stub server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the JSON body for one request
    ///
    /// The `source` field is left out for `auto`, which makes the API detect it.
    /// Language tags are sent with their region or script subtag.
    fn request_body(text: &str, source_locale: &str, target_locale: &str) -> serde_json::Value {
        let mut body = json!({
            "q": [text],
            "target": normalize_locale(target_locale),
            "format": "text"
        });
        if !is_auto_locale(source_locale) {
            body["source"] = json!(normalize_locale(source_locale));
        }
        body
    }

    /// Send one text to the API
    async fn send_request(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let url = format!("{}?key={}", self.base_url, self.api_key);
        let body = Self::request_body(text, source_locale, target_locale);

        debug!(chars = text.chars().count(), target_locale, "sending translation request");
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(if status.as_u16() == 429 {
                MtError::RateLimited(format!("API rate limit ({}): {}", status, error_text))
            } else if status.is_client_error() {
                MtError::Config(format!("API client error ({}): {}", status, error_text))
            } else {
                MtError::Provider(format!("API server error ({}): {}", status, error_text))
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MtError::Provider(format!("Failed to parse API response: {}", e)))?;

        let mut translations = Self::parse_translations(&json)?;
        if translations.len() != 1 {
            return Err(MtError::Provider(format!(
                "API returned {} translations for 1 text",
                translations.len()
            )));
        }
        Ok(translations.remove(0))
    }

    /// Extract `data.translations[].translatedText` from a response body
    fn parse_translations(json: &serde_json::Value) -> MtResult<Vec<String>> {
        let translations = json["data"]["translations"].as_array().ok_or_else(|| {
            MtError::Provider("Invalid API response: missing 'data.translations' array".to_string())
        })?;

        translations
            .iter()
            .map(|t| {
                t["translatedText"]
                    .as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        MtError::Provider(
                            "Invalid API response: missing 'translatedText' field".to_string(),
                        )
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_target_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.chars().count() > Self::MAX_CHARS_PER_STRING {
            return Err(MtError::Config(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_CHARS_PER_STRING
            )));
        }

        self.send_request(text, source_locale, target_locale).await
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Initialization Tests ==========

    #[test]
    fn test_new_with_valid_key() {
        let provider = GoogleTranslateProvider::new("test-api-key".to_string());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().provider_name(), "Google Translate");
    }

    #[test]
    fn test_new_with_empty_key() {
        let result = GoogleTranslateProvider::new("".to_string());
        match result {
            Err(MtError::Config(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_new_with_whitespace_key() {
        let result = GoogleTranslateProvider::new("   ".to_string());
        assert!(result.is_err());
    }

    // ========== Request Tests ==========

    #[test]
    fn test_request_body_with_source() {
        let body = GoogleTranslateProvider::request_body("hello", "en_US", "it");
        assert_eq!(body["source"], "en-US");
        assert_eq!(body["target"], "it");
        assert_eq!(body["format"], "text");
        assert_eq!(body["q"][0], "hello");
    }

    #[test]
    fn test_request_body_auto_source_is_omitted() {
        let body = GoogleTranslateProvider::request_body("hello", "auto", "it");
        assert!(body.get("source").is_none());
        assert_eq!(body["target"], "it");
    }

    #[test]
    fn test_request_body_keeps_region_subtag() {
        let body = GoogleTranslateProvider::request_body("hello", "auto", "zh-TW");
        assert_eq!(body["target"], "zh-TW");

        let body = GoogleTranslateProvider::request_body("hello", "pt-BR", "pt-PT");
        assert_eq!(body["source"], "pt-BR");
        assert_eq!(body["target"], "pt-PT");
    }

    // ========== Response Tests ==========

    #[test]
    fn test_parse_translations() {
        let json = json!({
            "data": {
                "translations": [
                    { "translatedText": "Ciao", "detectedSourceLanguage": "en" },
                    { "translatedText": "Arrivederci" }
                ]
            }
        });
        let parsed = GoogleTranslateProvider::parse_translations(&json).unwrap();
        assert_eq!(parsed, vec!["Ciao", "Arrivederci"]);
    }

    #[test]
    fn test_parse_translations_missing_array() {
        let json = json!({ "error": { "code": 400 } });
        match GoogleTranslateProvider::parse_translations(&json) {
            Err(MtError::Provider(msg)) => assert!(msg.contains("data.translations")),
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_translations_missing_text() {
        let json = json!({ "data": { "translations": [ { "detectedSourceLanguage": "en" } ] } });
        assert!(GoogleTranslateProvider::parse_translations(&json).is_err());
    }

    // ========== Validation Tests ==========

    #[tokio::test]
    async fn test_translate_empty_text() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let result = provider.translate("", "en", "it").await.unwrap();
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_translate_invalid_source_locale() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let result = provider.translate("hello", "invalid@code", "it").await;
        assert!(matches!(result, Err(MtError::InvalidLocale(_))));
    }

    #[tokio::test]
    async fn test_translate_auto_target_rejected() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let result = provider.translate("hello", "en", "auto").await;
        assert!(matches!(result, Err(MtError::InvalidLocale(_))));
    }

    #[tokio::test]
    async fn test_translate_text_too_long() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let long_text = "x".repeat(GoogleTranslateProvider::MAX_CHARS_PER_STRING + 1);
        match provider.translate(&long_text, "en", "it").await {
            Err(MtError::Config(msg)) => assert!(msg.contains("exceeds maximum")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let provider = GoogleTranslateProvider::with_timeout("test-key".to_string(), Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/translate");
        let result = provider.translate("hello", "en", "it").await;
        match result {
            Err(err) => assert!(err.is_retryable(), "unexpected error {:?}", err),
            Ok(text) => panic!("Expected an error, got {}", text),
        }
    }

    // ========== Debug Implementation Test ==========

    #[test]
    fn test_debug_output() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("test-key"));
    }

    // ========== Integration Tests (require real API key) ==========

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_single_translation() {
        if std::env::var(API_KEY_ENV).is_err() {
            eprintln!("Skipping: {} not set", API_KEY_ENV);
            return;
        }

        let provider = GoogleTranslateProvider::from_env().unwrap();
        let result = provider.translate("Hello", "auto", "it").await.unwrap();
        println!("Translation: {} → {}", "Hello", result);
        assert!(!result.is_empty());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_preserves_tokens() {
        if std::env::var(API_KEY_ENV).is_err() {
            eprintln!("Skipping: {} not set", API_KEY_ENV);
            return;
        }

        let provider = GoogleTranslateProvider::from_env().unwrap();
        let text = "Hello DYNKEY_0_, HTMLTAG_0_welcomeHTMLTAG_1_!";
        let result = provider.translate(text, "en", "it").await.unwrap();
        println!("Translated: {}", result);

        assert!(result.contains("DYNKEY_0_"));
        assert!(result.contains("HTMLTAG_0_"));
        assert!(result.contains("HTMLTAG_1_"));
    }
}
