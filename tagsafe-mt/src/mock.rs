//! Mock Machine Translator for testing
//!
//! A deterministic, API-free translator for exercising the pipeline without API keys or
//! network access. Every call is counted, so tests can also assert that the provider was
//! never reached.
//!
//! # Example
//!
//! ```ignore
//! use tagsafe_mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "en", "it").await.unwrap();
//!     assert_eq!(result, "hello_it");
//!     assert_eq!(mock.call_count(), 1);
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_it"
    Suffix,

    /// Use predefined mappings: (text, target_locale) → translation,
    /// falling back to `Suffix` for unknown texts
    Mappings(HashMap<(String, String), String>),

    /// Reverse the order of whitespace-separated words
    Reorder,

    /// Upper-case the text. Protection tokens are upper-case already, so they survive.
    Uppercase,

    /// Every call fails with `MtError::Provider`
    Error(String),

    /// Fail the first `failures` calls with a retryable network error, then return
    /// the input unchanged
    Flaky { failures: usize },

    /// Return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Clones share their call counter.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
    /// // Each translation will have ~50ms delay
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `translate` calls seen so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, _source: &str, target: &str) -> MtResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Reorder => Ok(text
                .split_whitespace()
                .rev()
                .collect::<Vec<_>>()
                .join(" ")),
            MockMode::Uppercase => Ok(text.to_uppercase()),
            MockMode::Error(msg) => Err(MtError::Provider(msg.clone())),
            MockMode::Flaky { failures } => {
                if call < *failures {
                    Err(MtError::Network(format!("simulated failure #{}", call + 1)))
                } else {
                    Ok(text.to_string())
                }
            }
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.apply_delay().await;
        self.apply_translation(text, source_locale, target_locale)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
