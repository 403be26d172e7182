//! Protection of template placeholders and HTML tags during machine translation
//!
//! Before text is handed to a translation provider, every `{{ ... }}` placeholder and
//! every `< ... >` tag is swapped for an opaque token. The provider only ever sees the
//! tokens, so it cannot translate variable names or rewrite markup. After translation
//! the tokens are swapped back for the original spans.
//!
//! # Token format
//!
//! Tokens look like `DYNKEY_0_` and `HTMLTAG_3_`. They are built from `[A-Z0-9_]` only,
//! so they
//! - contain no whitespace (the chunker treats each one as a single word),
//! - never match the placeholder or tag patterns themselves.
//!
//! If the source text already contains one of the prefixes, the prefix is extended with
//! `X` until it no longer occurs, which keeps the tokens of a pass unique.
//!
//! # Example
//!
//! ```
//! use tagsafe::protect::protect;
//!
//! let protected = protect("Hello {{name}}, <b>welcome</b>!");
//! assert_eq!(protected.text(), "Hello DYNKEY_0_, HTMLTAG_0_welcomeHTMLTAG_1_!");
//!
//! // The provider returns the tokens untouched
//! let translated = "Ciao DYNKEY_0_, HTMLTAG_0_benvenuto HTMLTAG_1_!";
//! assert_eq!(protected.restore(translated), "Ciao {{name}}, <b>benvenuto </b>!");
//! ```

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Template placeholders such as `{{ user.name }}` (lazy, single line)
static DYNAMIC_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{.*?\}\}").expect("placeholder pattern is valid"));

/// Opening, closing and self-closing HTML tags, attributes included (lazy, single line)
static HTML_TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("tag pattern is valid"));

const DYNAMIC_KEY_PREFIX: &str = "DYNKEY";
const HTML_TAG_PREFIX: &str = "HTMLTAG";

/// The kind of content a protected span holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// A template placeholder: `{{ variable }}`
    DynamicKey,
    /// An HTML tag: `<p>`, `</a>`, `<br/>`, `<a href="...">`
    HtmlTag,
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanKind::DynamicKey => write!(f, "dynamic key"),
            SpanKind::HtmlTag => write!(f, "HTML tag"),
        }
    }
}

/// A span of the source text that was replaced by a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    /// Index of the span among the spans of the same kind, in capture order
    pub token_id: usize,
    /// The text the token stands for
    pub original_text: String,
    /// Whether this is a placeholder or a tag
    pub kind: SpanKind,
}

/// Token prefixes used by a single protection pass
#[derive(Debug, Clone)]
pub struct TokenScheme {
    key_prefix: String,
    tag_prefix: String,
    pattern: Regex,
}

impl TokenScheme {
    /// Pick prefixes that do not occur anywhere in `text`
    fn for_text(text: &str) -> Self {
        let key_prefix = unused_prefix(text, DYNAMIC_KEY_PREFIX);
        let tag_prefix = unused_prefix(text, HTML_TAG_PREFIX);
        let pattern = Regex::new(&format!(
            r"({}|{})_(\d+)_",
            regex::escape(&key_prefix),
            regex::escape(&tag_prefix)
        ))
        .expect("token pattern is built from [A-Z] prefixes");

        Self {
            key_prefix,
            tag_prefix,
            pattern,
        }
    }

    /// The token that stands for span `id` of the given kind
    pub fn token(&self, kind: SpanKind, id: usize) -> String {
        match kind {
            SpanKind::DynamicKey => format!("{}_{}_", self.key_prefix, id),
            SpanKind::HtmlTag => format!("{}_{}_", self.tag_prefix, id),
        }
    }

    fn count_tokens(&self, text: &str) -> HashMap<(SpanKind, usize), usize> {
        let mut counts = HashMap::new();
        for caps in self.pattern.captures_iter(text) {
            if let Ok(id) = caps[2].parse::<usize>() {
                *counts.entry((self.kind_of(&caps[1]), id)).or_default() += 1;
            }
        }
        counts
    }

    fn kind_of(&self, prefix: &str) -> SpanKind {
        if prefix == self.key_prefix {
            SpanKind::DynamicKey
        } else {
            SpanKind::HtmlTag
        }
    }
}

fn unused_prefix(text: &str, base: &str) -> String {
    let mut prefix = base.to_string();
    while text.contains(&prefix) {
        prefix.push('X');
    }
    prefix
}

/// Result of a protection pass: the tokenized text and what each token stands for
///
/// A `Protected` value is only meaningful for the text it was produced from. Restoring
/// a translation with the spans of another pass gives undefined output.
#[derive(Debug, Clone)]
pub struct Protected {
    text: String,
    spans: Vec<ProtectedSpan>,
    key_count: usize,
    scheme: TokenScheme,
}

impl Protected {
    /// The text with all placeholders and tags replaced by tokens
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All captured spans: dynamic keys first, then tags, each in capture order
    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    /// The captured placeholders
    pub fn dynamic_keys(&self) -> &[ProtectedSpan] {
        &self.spans[..self.key_count]
    }

    /// The captured HTML tags
    pub fn html_tags(&self) -> &[ProtectedSpan] {
        &self.spans[self.key_count..]
    }

    /// The token prefixes of this pass
    pub fn scheme(&self) -> &TokenScheme {
        &self.scheme
    }

    /// Whether any span was captured at all
    pub fn has_spans(&self) -> bool {
        !self.spans.is_empty()
    }

    fn lookup(&self, kind: SpanKind, id: usize) -> Option<&ProtectedSpan> {
        match kind {
            SpanKind::DynamicKey => self.dynamic_keys().get(id),
            SpanKind::HtmlTag => self.html_tags().get(id),
        }
    }

    /// Replace the tokens in `text` with the spans they stand for
    ///
    /// See [`restore`].
    pub fn restore(&self, text: &str) -> String {
        restore(text, self)
    }

    /// Count how often each token of this pass occurs in `text`
    ///
    /// Used after translation to detect tokens the provider dropped or duplicated.
    pub fn token_report(&self, text: &str) -> TokenReport {
        let expected = self.scheme.count_tokens(&self.text);
        let seen = self.scheme.count_tokens(text);

        let mut report = TokenReport::default();
        for span in &self.spans {
            let key = (span.kind, span.token_id);
            // keys nested inside a tag never reach the provider
            let Some(&wanted) = expected.get(&key) else {
                continue;
            };
            let found = seen.get(&key).copied().unwrap_or(0);
            if found == 0 {
                report.missing.push(self.scheme.token(span.kind, span.token_id));
            } else if found > wanted {
                report
                    .duplicated
                    .push(self.scheme.token(span.kind, span.token_id));
            }
        }
        report
    }
}

/// Tokens that did not survive translation exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenReport {
    /// Tokens absent from the translated text
    pub missing: Vec<String>,
    /// Tokens that occur more than once in the translated text
    pub duplicated: Vec<String>,
}

impl TokenReport {
    /// True when every token occurs exactly once
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty()
    }
}

/// Replace placeholders and HTML tags with opaque tokens
///
/// Placeholders are protected first, so a `{{ x }}` inside a tag attribute is already a
/// token when the tag pattern runs. Such a tag records its original text with the
/// placeholder expanded back, which lets [`restore`] work in a single pass.
///
/// Every match gets its own token, even when the same placeholder text appears twice.
///
/// # Arguments
///
/// * `text` - The text to protect
///
/// # Returns
///
/// The tokenized text together with the captured spans and the token scheme.
///
/// # Example
///
/// ```
/// use tagsafe::protect::{protect, SpanKind};
///
/// let protected = protect("{{x}} hi {{x}}");
/// assert_eq!(protected.text(), "DYNKEY_0_ hi DYNKEY_1_");
/// assert_eq!(protected.dynamic_keys().len(), 2);
/// assert_eq!(protected.spans()[1].kind, SpanKind::DynamicKey);
/// ```
pub fn protect(text: &str) -> Protected {
    let scheme = TokenScheme::for_text(text);
    let mut spans: Vec<ProtectedSpan> = Vec::new();

    let keyed = DYNAMIC_KEY_PATTERN
        .replace_all(text, |caps: &Captures| {
            let token_id = spans.len();
            spans.push(ProtectedSpan {
                token_id,
                original_text: caps[0].to_string(),
                kind: SpanKind::DynamicKey,
            });
            scheme.token(SpanKind::DynamicKey, token_id)
        })
        .into_owned();
    let key_count = spans.len();

    let mut tags: Vec<ProtectedSpan> = Vec::new();
    let tagged = HTML_TAG_PATTERN
        .replace_all(&keyed, |caps: &Captures| {
            let token_id = tags.len();
            tags.push(ProtectedSpan {
                token_id,
                original_text: expand_tokens(&caps[0], &scheme, &spans),
                kind: SpanKind::HtmlTag,
            });
            scheme.token(SpanKind::HtmlTag, token_id)
        })
        .into_owned();
    spans.extend(tags);

    debug!(
        dynamic_keys = key_count,
        html_tags = spans.len() - key_count,
        "protected text"
    );

    Protected {
        text: tagged,
        spans,
        key_count,
        scheme,
    }
}

/// Expand the dynamic key tokens inside a captured tag
fn expand_tokens(text: &str, scheme: &TokenScheme, keys: &[ProtectedSpan]) -> String {
    scheme
        .pattern
        .replace_all(text, |caps: &Captures| {
            let found = match scheme.kind_of(&caps[1]) {
                SpanKind::DynamicKey => caps[2]
                    .parse::<usize>()
                    .ok()
                    .and_then(|id| keys.get(id)),
                SpanKind::HtmlTag => None,
            };
            found
                .map(|span| span.original_text.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Replace the tokens of a protection pass with their original spans
///
/// Scans `text` once, left to right. Tokens whose index is unknown to `protected` are
/// left as they are. The caller must pass the [`Protected`] value produced for the
/// source of `text`; mismatched passes are not detected.
///
/// # Example
///
/// ```
/// use tagsafe::protect::{protect, restore};
///
/// let protected = protect("<a href=\"{{url}}\">Docs</a>");
/// assert_eq!(protected.text(), "HTMLTAG_0_DocsHTMLTAG_1_");
/// assert_eq!(restore("HTMLTAG_0_DokumenteHTMLTAG_1_", &protected), "<a href=\"{{url}}\">Dokumente</a>");
/// ```
pub fn restore(text: &str, protected: &Protected) -> String {
    if !protected.has_spans() {
        return text.to_string();
    }

    protected
        .scheme
        .pattern
        .replace_all(text, |caps: &Captures| {
            let kind = protected.scheme.kind_of(&caps[1]);
            caps[2]
                .parse::<usize>()
                .ok()
                .and_then(|id| protected.lookup(kind, id))
                .map(|span| span.original_text.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
