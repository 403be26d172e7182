//! Machine translation of text and JSON documents
//!
//! Template placeholders (`{{ name }}`) and HTML tags are swapped for opaque tokens
//! before text reaches the translator and put back afterwards, so only natural-language
//! content changes. Long strings are cut into chunks at word boundaries and stitched
//! back together with their original whitespace.
//!
//! # Workflow Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tagsafe_mt::{
//!     BatchConfig, ContentTranslator, FileFormat, GoogleTranslateProvider,
//!     TranslationSettings, run_batch,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Pick a provider
//!     let provider = GoogleTranslateProvider::from_env()?;
//!
//!     // 2. Wrap it with protection, chunking and retries
//!     let translator = ContentTranslator::new(
//!         Arc::new(provider),
//!         TranslationSettings::new("auto", "it"),
//!     )?;
//!
//!     // 3. Translate a single string...
//!     let text = translator.translate_string("Hello {{name}}, <b>welcome</b>!").await?;
//!     println!("{}", text);
//!
//!     // 4. ...or a directory of JSON files
//!     let config = BatchConfig::new("locales/en", "locales/it", FileFormat::Json);
//!     let report = run_batch(&translator, &config).await?;
//!     println!("{} translated, {} failed", report.translated, report.failed);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod pipeline;
pub mod retry;
pub mod translator;


// Re-export main types for convenient access
pub use batch::{BatchConfig, BatchReport, FileFormat, FileOutcome, run_batch};
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use pipeline::{
    ContentTranslator, DEFAULT_CHUNK_LIMIT, DEFAULT_CHUNK_THRESHOLD, TranslationSettings,
};
pub use retry::RetryPolicy;
pub use translator::{AUTO_LOCALE, MachineTranslator};
