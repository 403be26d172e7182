//! Word-boundary chunking of long text
//!
//! Translation providers cap the size of a single request, so long documents are cut
//! into chunks of at most `limit` characters. Cuts only happen between words. The
//! whitespace at each cut is kept in the [`ChunkPlan`], which lets
//! [`ChunkPlan::reassemble`] put the translated chunks back together with the exact
//! original spacing.
//!
//! Protection tokens contain no whitespace, so a token is always a whole word and is
//! never split across two chunks.

use tracing::debug;

/// One unit of text sent to the translator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text. Starts and ends with a non-whitespace character; whitespace
    /// between the words inside it is kept verbatim.
    pub body: String,
    /// The whitespace that followed the chunk in the source (empty for the last chunk
    /// unless the text ended with whitespace)
    pub separator: String,
}

/// A text split into chunks, with every byte of whitespace accounted for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    leading: String,
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// Whitespace before the first word
    pub fn leading(&self) -> &str {
        &self.leading
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The chunk bodies in order
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.body.as_str())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Rebuild the text from replacement bodies, one per chunk, in chunk order
    ///
    /// Returns `None` when the number of bodies differs from the number of chunks.
    /// Passing the original bodies gives back the original text byte for byte.
    pub fn reassemble<I, S>(&self, bodies: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.leading.clone();
        let mut count = 0;
        for body in bodies {
            let chunk = self.chunks.get(count)?;
            out.push_str(body.as_ref());
            out.push_str(&chunk.separator);
            count += 1;
        }
        (count == self.chunks.len()).then_some(out)
    }
}

/// Iterate over `(word, following whitespace)` pairs; `text` must not start with whitespace
fn words_with_separators(text: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (word, tail) = rest.split_at(word_end);
        let sep_end = tail
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(tail.len());
        let (separator, next) = tail.split_at(sep_end);
        rest = next;
        Some((word, separator))
    })
}

/// Split `text` into chunks of at most `limit` characters at whitespace boundaries
///
/// Words are added greedily. A word is appended to the current chunk when the chunk
/// length plus the whitespace before the word plus the word still fits in `limit`;
/// otherwise the chunk is closed and the word starts the next one. A single word longer
/// than `limit` becomes its own oversized chunk, it is never cut.
///
/// Lengths are counted in `char`s.
///
/// # Example
///
/// ```
/// use tagsafe::chunk::split_chunks;
///
/// let plan = split_chunks("one two  three", 8);
/// let bodies: Vec<&str> = plan.bodies().collect();
/// assert_eq!(bodies, vec!["one two", "three"]);
/// assert_eq!(plan.reassemble(bodies).unwrap(), "one two  three");
/// ```
pub fn split_chunks(text: &str, limit: usize) -> ChunkPlan {
    let rest = text.trim_start();
    let leading = text[..text.len() - rest.len()].to_string();

    let mut chunks = Vec::new();
    let mut body = String::new();
    let mut body_len = 0;
    let mut pending_separator = String::new();

    for (word, separator) in words_with_separators(rest) {
        let word_len = word.chars().count();
        if body.is_empty() {
            body.push_str(word);
            body_len = word_len;
        } else {
            let separator_len = pending_separator.chars().count();
            if body_len + separator_len + word_len > limit {
                chunks.push(Chunk {
                    body: std::mem::take(&mut body),
                    separator: std::mem::take(&mut pending_separator),
                });
                body.push_str(word);
                body_len = word_len;
            } else {
                body.push_str(&pending_separator);
                body.push_str(word);
                body_len += separator_len + word_len;
            }
        }
        pending_separator = separator.to_string();
    }

    if !body.is_empty() {
        chunks.push(Chunk {
            body,
            separator: pending_separator,
        });
    }

    debug!(chunks = chunks.len(), limit, "split text into chunks");

    ChunkPlan { leading, chunks }
}

/// Split `text` into chunk bodies of at most `limit` characters
///
/// Convenience wrapper around [`split_chunks`] that drops the whitespace bookkeeping.
/// Empty or whitespace-only input gives an empty vector.
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    split_chunks(text, limit)
        .chunks
        .into_iter()
        .map(|c| c.body)
        .collect()
}
