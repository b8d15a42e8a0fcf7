//! Plain-text helpers for previews.

/// Separator used to approximate sentence boundaries.
pub const SENTENCE_SEPARATOR: &str = ". ";

/// Collapse whitespace inside each paragraph while keeping paragraph breaks.
///
/// Paragraphs are split on `"\n\n"`, blank ones are dropped, and the rest are
/// rejoined with `"\n\n"`. Applying it twice gives the same result as once.
pub fn clean_text_block(block: &str) -> String {
    block
        .split("\n\n")
        .map(|para| para.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|para| !para.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The first `limit` pieces of `text` split on `". "`.
///
/// This is a naive splitter: abbreviations and other punctuation are not
/// handled, and the pieces keep any trailing period of the last sentence.
pub fn leading_sentences(text: &str, limit: usize) -> Vec<&str> {
    text.split(SENTENCE_SEPARATOR).take(limit).collect()
}

/// Prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
