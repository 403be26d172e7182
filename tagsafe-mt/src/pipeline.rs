//! Translation of strings and JSON values with protected placeholders and markup
//!
//! Every string goes through the same steps:
//!
//! 1. protect `{{ placeholders }}` and `<tags>` ([`tagsafe::protect`])
//! 2. split into chunks - one chunk unless the string is longer than
//!    `chunk_threshold` characters, then chunks of at most `chunk_limit`
//! 3. one translator call per chunk, in order, each with retries
//! 4. reassemble with the original whitespace and restore the protected spans
//!
//! [`ContentTranslator::translate_value`] applies this to every string leaf of a JSON
//! value and leaves keys and non-string leaves alone.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tagsafe_mt::{ContentTranslator, MockMode, MockTranslator, TranslationSettings};
//!
//! let translator = ContentTranslator::new(
//!     Arc::new(MockTranslator::new(MockMode::Uppercase)),
//!     TranslationSettings::new("auto", "it"),
//! )?;
//! let out = translator.translate_string("Hello {{name}}, <b>welcome</b>!").await?;
//! assert_eq!(out, "HELLO {{name}}, <b>WELCOME</b>!");
//! ```

use crate::error::{MtError, MtResult};
use crate::retry::RetryPolicy;
use crate::translator::{MachineTranslator, validate_locale, validate_target_locale};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tagsafe::{Protected, protect, split_chunks};
use tracing::{debug, warn};

/// Strings longer than this many characters are translated in chunks
pub const DEFAULT_CHUNK_THRESHOLD: usize = 4000;

/// Maximum characters per chunk sent to the translator
pub const DEFAULT_CHUNK_LIMIT: usize = 4000;

/// Languages, chunk sizes and retry behaviour of a translation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSettings {
    /// Source language code, or `auto` for detection
    pub source_locale: String,
    pub target_locale: String,
    pub chunk_threshold: usize,
    pub chunk_limit: usize,
    pub retry: RetryPolicy,
}

impl TranslationSettings {
    /// Settings with the default chunk sizes and retry policy
    pub fn new(source_locale: impl Into<String>, target_locale: impl Into<String>) -> Self {
        Self {
            source_locale: source_locale.into(),
            target_locale: target_locale.into(),
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn validate(&self) -> MtResult<()> {
        validate_locale(&self.source_locale)?;
        validate_target_locale(&self.target_locale)?;
        if self.chunk_limit == 0 {
            return Err(MtError::Config("chunk limit must be positive".to_string()));
        }
        Ok(())
    }
}

type ValueFuture<'a> = Pin<Box<dyn Future<Output = MtResult<Value>> + Send + 'a>>;

/// Translates strings and JSON values through an injected [`MachineTranslator`]
///
/// Holds no state between calls; one instance can translate any number of strings,
/// values and files.
#[derive(Clone)]
pub struct ContentTranslator {
    translator: Arc<dyn MachineTranslator>,
    settings: TranslationSettings,
}

impl std::fmt::Debug for ContentTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTranslator")
            .field("provider", &self.translator.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ContentTranslator {
    /// # Errors
    ///
    /// `MtError::InvalidLocale` or `MtError::Config` when the settings are unusable.
    pub fn new(
        translator: Arc<dyn MachineTranslator>,
        settings: TranslationSettings,
    ) -> MtResult<Self> {
        settings.validate()?;
        Ok(Self {
            translator,
            settings,
        })
    }

    pub fn settings(&self) -> &TranslationSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    /// One translator call for one piece of protected text, with retries
    async fn invoke(&self, text: &str) -> MtResult<String> {
        let translator = &self.translator;
        let source = self.settings.source_locale.as_str();
        let target = self.settings.target_locale.as_str();

        self.settings
            .retry
            .run(translator.provider_name(), move || {
                translator.translate(text, source, target)
            })
            .await
    }

    /// Translate one string, keeping placeholders, tags and surrounding whitespace
    ///
    /// Blank strings are returned as they are, without calling the translator. Every
    /// other chunk is sent, even one made only of digits and punctuation, since number
    /// formatting is locale specific. Any chunk that still fails after its retries fails
    /// the whole string; no partial translation is returned.
    pub async fn translate_string(&self, text: &str) -> MtResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let protected = protect(text);
        let length = text.chars().count();
        // Below the threshold the whole string is a single chunk
        let limit = if length > self.settings.chunk_threshold {
            self.settings.chunk_limit
        } else {
            usize::MAX
        };

        let plan = split_chunks(protected.text(), limit);
        debug!(chars = length, chunks = plan.len(), "translating string");

        let mut translated = Vec::with_capacity(plan.len());
        for (index, body) in plan.bodies().enumerate() {
            debug!(
                chunk = index + 1,
                total = plan.len(),
                chars = body.chars().count(),
                "translating chunk"
            );
            translated.push(self.invoke(body).await?);
        }

        let joined = plan.reassemble(&translated).ok_or_else(|| {
            MtError::Provider(format!(
                "got {} translated chunks for {} source chunks",
                translated.len(),
                plan.len()
            ))
        })?;

        Ok(Self::restore_checked(&protected, &joined))
    }

    fn restore_checked(protected: &Protected, translated: &str) -> String {
        let report = protected.token_report(translated);
        if !report.is_clean() {
            warn!(
                missing = ?report.missing,
                duplicated = ?report.duplicated,
                "translator did not keep every protection token"
            );
        }
        protected.restore(translated)
    }

    /// Translate every string leaf of a JSON value
    ///
    /// Mapping keys and their order, sequence lengths and order, and all numbers,
    /// booleans and nulls are carried over unchanged.
    pub fn translate_value<'a>(&'a self, value: &'a Value) -> ValueFuture<'a> {
        Box::pin(async move {
            match value {
                Value::String(text) => Ok(Value::String(self.translate_string(text).await?)),
                Value::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.translate_value(item).await?);
                    }
                    Ok(Value::Array(out))
                }
                Value::Object(map) => {
                    let mut out = Map::with_capacity(map.len());
                    for (key, item) in map {
                        out.insert(key.clone(), self.translate_value(item).await?);
                    }
                    Ok(Value::Object(out))
                }
                Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockMode, MockTranslator};
    use serde_json::json;
    use std::time::Duration;

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            call_timeout: Duration::from_secs(5),
        }
    }

    fn translator_with(mock: &MockTranslator) -> ContentTranslator {
        let settings = TranslationSettings {
            retry: fast_retry(3),
            ..TranslationSettings::new("auto", "it")
        };
        ContentTranslator::new(Arc::new(mock.clone()), settings).unwrap()
    }

    #[test]
    fn test_settings_validation() {
        assert!(TranslationSettings::new("auto", "it").validate().is_ok());
        assert!(TranslationSettings::new("en", "auto").validate().is_err());
        assert!(TranslationSettings::new("e n", "it").validate().is_err());

        let zero = TranslationSettings {
            chunk_limit: 0,
            ..TranslationSettings::new("en", "it")
        };
        assert!(matches!(zero.validate(), Err(MtError::Config(_))));
    }

    #[tokio::test]
    async fn test_identity_roundtrip_with_markup() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let source = "Hello {{name}}, <b>welcome</b>!";
        let out = translator_with(&mock).translate_string(source).await.unwrap();
        assert_eq!(out, source);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_translation_keeps_placeholders_and_tags() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let out = translator_with(&mock)
            .translate_string("Hello {{name}}, <b>welcome</b>!")
            .await
            .unwrap();
        assert_eq!(out, "HELLO {{name}}, <b>WELCOME</b>!");
    }

    #[tokio::test]
    async fn test_duplicate_placeholders_restored() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let out = translator_with(&mock)
            .translate_string("{{x}} hi {{x}}")
            .await
            .unwrap();
        assert_eq!(out, "{{x}} HI {{x}}");
    }

    #[tokio::test]
    async fn test_reordering_translator_keeps_spans_attached() {
        let mock = MockTranslator::new(MockMode::Reorder);
        let out = translator_with(&mock)
            .translate_string("{{a}} sent {{b}}")
            .await
            .unwrap();
        assert_eq!(out, "{{b}} sent {{a}}");
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_preserved() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let out = translator_with(&mock)
            .translate_string("\n  hello world  \n")
            .await
            .unwrap();
        assert_eq!(out, "\n  hello world_it  \n");
    }

    #[tokio::test]
    async fn test_blank_strings_skip_translator() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = translator_with(&mock);
        assert_eq!(translator.translate_string("").await.unwrap(), "");
        assert_eq!(translator.translate_string("  \n").await.unwrap(), "  \n");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_numbers_and_markup_are_still_translated() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = translator_with(&mock);
        assert_eq!(
            translator.translate_string("{{count}} 1,234.50").await.unwrap(),
            "{{count}} 1,234.50_it"
        );
        assert_eq!(translator.translate_string("12:30").await.unwrap(), "12:30_it");
        assert_eq!(
            translator.translate_string("{{count}} <br/>").await.unwrap(),
            "{{count}} <br/>_it"
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_every_chunk_is_sent() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let settings = TranslationSettings {
            chunk_threshold: 5,
            chunk_limit: 5,
            retry: fast_retry(1),
            ..TranslationSettings::new("en", "it")
        };
        let translator = ContentTranslator::new(Arc::new(mock.clone()), settings).unwrap();
        let out = translator
            .translate_string("hello 1,234 {{x}} world")
            .await
            .unwrap();
        assert_eq!(out, "hello 1,234 {{x}} world");
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn test_large_document_identity_is_exact() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let mut text = String::new();
        let mut i = 0;
        while text.len() < 10_000 {
            text.push_str(&format!("word{} ", i));
            if i % 17 == 0 {
                text.push('\n');
            }
            i += 1;
        }
        text.truncate(10_000);

        let out = translator_with(&mock).translate_string(&text).await.unwrap();
        assert_eq!(out, text);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_large_document_with_markup() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let paragraph = "<p>Dear {{ user.name }}, see <a href=\"{{url}}\">the docs</a>.</p>\n";
        let text = paragraph.repeat(150);
        assert!(text.chars().count() > DEFAULT_CHUNK_THRESHOLD);

        let out = translator_with(&mock).translate_string(&text).await.unwrap();
        let expected =
            "<p>DEAR {{ user.name }}, SEE <a href=\"{{url}}\">THE DOCS</a>.</p>\n".repeat(150);
        assert_eq!(out, expected);
        assert!(mock.call_count() >= 2);
    }

    #[tokio::test]
    async fn test_below_threshold_is_single_call() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let text = "short words ".repeat(300);
        assert!(text.chars().count() <= DEFAULT_CHUNK_THRESHOLD);
        translator_with(&mock).translate_string(&text).await.unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_threshold_and_limit() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let settings = TranslationSettings {
            chunk_threshold: 10,
            chunk_limit: 10,
            retry: fast_retry(1),
            ..TranslationSettings::new("en", "it")
        };
        let translator = ContentTranslator::new(Arc::new(mock.clone()), settings).unwrap();
        let out = translator
            .translate_string("aaaa bbbb cccc dddd")
            .await
            .unwrap();
        assert_eq!(out, "aaaa bbbb cccc dddd");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_fails_string() {
        let mock = MockTranslator::new(MockMode::Error("quota exceeded".to_string()));
        let result = translator_with(&mock).translate_string("hello").await;
        assert!(matches!(result, Err(MtError::Provider(_))));
        // Provider errors are retried
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mock = MockTranslator::new(MockMode::Flaky { failures: 2 });
        let out = translator_with(&mock).translate_string("hello").await.unwrap();
        assert_eq!(out, "hello");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_slow_translator_times_out() {
        let mock = MockTranslator::with_delay(MockMode::NoOp, 300);
        let settings = TranslationSettings {
            retry: RetryPolicy {
                call_timeout: Duration::from_millis(20),
                ..fast_retry(2)
            },
            ..TranslationSettings::new("en", "it")
        };
        let translator = ContentTranslator::new(Arc::new(mock), settings).unwrap();
        let result = translator.translate_string("hello").await;
        assert_eq!(result, Err(MtError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_value_shape_preserved() {
        let mock = MockTranslator::new(MockMode::Uppercase);
        let input = json!({
            "title": "Welcome {{name}}",
            "count": 3,
            "ratio": 0.5,
            "enabled": true,
            "missing": null,
            "items": ["first", 2, "<i>third</i>", [false, "nested"]],
            "nested": { "zeta": "last", "alpha": "first" }
        });

        let out = translator_with(&mock).translate_value(&input).await.unwrap();
        assert_eq!(
            out,
            json!({
                "title": "WELCOME {{name}}",
                "count": 3,
                "ratio": 0.5,
                "enabled": true,
                "missing": null,
                "items": ["FIRST", 2, "<i>THIRD</i>", [false, "NESTED"]],
                "nested": { "zeta": "LAST", "alpha": "FIRST" }
            })
        );
    }

    #[tokio::test]
    async fn test_value_key_order_preserved() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let input: Value = serde_json::from_str(r#"{"z": "a", "m": "b", "a": "c"}"#).unwrap();
        let out = translator_with(&mock).translate_value(&input).await.unwrap();

        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "m", "a"]);
        assert_eq!(out["z"], "a_it");
    }

    #[tokio::test]
    async fn test_value_scalars_untouched() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = translator_with(&mock);
        for value in [json!(null), json!(true), json!(42), json!(-1.25), json!([])] {
            assert_eq!(translator.translate_value(&value).await.unwrap(), value);
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_value_error_propagates() {
        let mock = MockTranslator::new(MockMode::Error("down".to_string()));
        let input = json!({ "a": 1, "b": ["text"] });
        assert!(translator_with(&mock).translate_value(&input).await.is_err());
    }
}
