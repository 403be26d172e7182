//! Structural helpers for machine translation of templated markup
//!
//! This crate holds the parts of the translation pipeline that never talk to a
//! translation provider:
//!
//! 1. **Protection** ([`protect`]) - swaps `{{ placeholders }}` and `<html>` tags for
//!    opaque tokens and swaps them back after translation
//! 2. **Chunking** ([`chunk`]) - cuts long text into size-limited chunks at word
//!    boundaries and reassembles them with the original whitespace
//!
//! # Example
//!
//! ```
//! use tagsafe::{protect, split_chunks};
//!
//! let source = "Hello {{name}}, <b>welcome</b>!";
//! let protected = protect(source);
//! let plan = split_chunks(protected.text(), 4000);
//!
//! // A real pipeline sends each chunk body to a translator here
//! let joined = plan.reassemble(plan.bodies()).unwrap();
//! assert_eq!(protected.restore(&joined), source);
//! ```

pub mod chunk;
pub mod protect;

pub use chunk::{Chunk, ChunkPlan, chunk, split_chunks};
pub use protect::{ProtectedSpan, Protected, SpanKind, TokenReport, TokenScheme, protect, restore};
