//! Text canonicalization for noisy wordbook lines.
//!
//! The source text comes out of a scanned document, so full-width and
//! half-width punctuation are freely interleaved and whitespace is
//! unreliable. Everything downstream assumes lines have passed through
//! [`normalize_line`] first.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A Latin word token embedded in a hint. Matched with \b so tokens glued
    // directly onto CJK text (no word boundary) are left alone.
    static ref LATIN_WORD: Regex = Regex::new(r"\b[A-Za-z][A-Za-z\-']*\b").unwrap();

    // Bracket-family characters that survive into hint fragments.
    static ref BRACKET_CHARS: Regex = Regex::new(r"[\\\[\](){}<>]").unwrap();

    // Whitespace runs left behind by the cleanup substitutions.
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Script membership checks.
    static ref CJK_CHAR: Regex = Regex::new(r"[\u{4e00}-\u{9fff}]").unwrap();
    static ref LATIN_CHAR: Regex = Regex::new(r"[A-Za-z]").unwrap();
}

// Characters stripped from both ends of a hint fragment.
const HINT_EDGE_CHARS: &str = " +-:：,，;；。";

/// Canonicalize one line or fragment: fold the common full-width variants to
/// ASCII, collapse whitespace runs to single spaces, trim.
pub fn normalize_line(text: &str) -> String {
    let folded = text
        .replace('\u{3000}', " ")
        .replace('\t', " ")
        .replace('（', "(")
        .replace('）', ")")
        .replace('【', "[")
        .replace('】', "]")
        .replace('：', ":");
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a word token: drop ALL whitespace (words are sometimes split
/// across a line break in the source) and lowercase.
pub fn normalize_word(word: &str) -> String {
    word.split_whitespace().collect::<String>().to_lowercase()
}

/// Clean the raw hint text that trails a morpheme inside a decomposition
/// piece. Hints should end up as gloss text in the document's CJK script;
/// glue symbols, leftover Latin fragments, and bracket characters go.
pub fn clean_hint(raw: &str) -> String {
    let hint = raw.trim_matches(|c| HINT_EDGE_CHARS.contains(c));
    let hint = hint.replace('→', " ").replace('+', " ").replace('＋', " ");
    let hint = LATIN_WORD.replace_all(&hint, " ");
    let hint = BRACKET_CHARS.replace_all(&hint, " ");
    let hint = WHITESPACE_RUN.replace_all(&hint, " ");
    hint.trim_matches(|c| HINT_EDGE_CHARS.contains(c)).to_string()
}

/// True if the text contains at least one CJK ideograph.
pub fn has_cjk(text: &str) -> bool {
    CJK_CHAR.is_match(text)
}

/// True if the text contains at least one ASCII Latin letter.
pub fn has_latin(text: &str) -> bool {
    LATIN_CHAR.is_match(text)
}
