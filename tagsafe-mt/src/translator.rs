//! Machine Translation trait and locale helpers
//!
//! `MachineTranslator` is the seam between the content pipeline and whatever actually
//! translates text (Google Translate, a mock, ...). The pipeline receives it as an
//! injected `Arc<dyn MachineTranslator>`, so tests can swap in deterministic fakes.
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
//!     // "auto" lets the provider detect the source language
//!     let result = provider.translate("Hello, world!", "auto", "it").await?;
//!     println!("{}", result); // "Ciao mondo!"
//!
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use async_trait::async_trait;

/// Source locale value that asks the provider to detect the language
pub const AUTO_LOCALE: &str = "auto";

/// Generic trait for machine translation providers
///
/// All methods are async to support I/O-bound operations like network requests.
/// A call may be slow and may fail; retrying is the caller's business.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_locale` - Source language code (e.g., "en", "pt-BR") or [`AUTO_LOCALE`]
    /// * `target_locale` - Target language code (e.g., "it")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Name of the provider, used in log output
    fn provider_name(&self) -> &str;
}

/// Whether `locale` asks for source language detection
pub fn is_auto_locale(locale: &str) -> bool {
    locale.eq_ignore_ascii_case(AUTO_LOCALE)
}

/// Normalize a locale code to the hyphenated form providers expect
///
/// Region and script subtags are kept, since they select a different language variant
/// (`zh-TW` is not `zh`).
///
/// - `pt_BR` → `pt-BR`
/// - ` zh-TW ` → `zh-TW`
pub fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-")
}

/// Validate that a locale code is in acceptable format
///
/// Accepts [`AUTO_LOCALE`] and codes made of ASCII letters, digits, hyphens and
/// underscores.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

/// Validate a target locale: like [`validate_locale`] but `auto` is meaningless here
pub fn validate_target_locale(locale: &str) -> MtResult<()> {
    validate_locale(locale)?;
    if is_auto_locale(locale) {
        return Err(MtError::InvalidLocale(
            "Target locale cannot be 'auto'".to_string(),
        ));
    }
    Ok(())
}
