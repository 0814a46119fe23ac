//! Line-level extraction: noise filtering, layout matching, component
//! parsing, and the run-scoped [`Scanner`] that turns page texts into
//! deduplicated entries.
//!
//! Everything here is best-effort. A line, piece, or candidate that fails a
//! structural check is dropped and tallied in [`ScanStats`]; nothing raises.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::normalize::{clean_hint, normalize_line, normalize_word};

lazy_static! {
    // Line layouts. Word chars are Latin letters, hyphens, apostrophes, and
    // spaces (words get split across line breaks in the source).
    static ref LINE_BRACKET: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z\-' ]*)\s*\[([^\]]{2,})\]\s*(.+)$").unwrap();
    static ref LINE_PAREN: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z\-' ]*)\s+([^\[\(]{1,})\s*\(([^)]{2,})\)\s*$").unwrap();

    // Leading Latin token of a decomposition piece; the remainder is the hint.
    static ref LATIN_TOKEN: Regex = Regex::new(r"^([A-Za-z][A-Za-z\-']*)(.*)$").unwrap();

    // Anything a normalized word must not contain.
    static ref WORD_REJECT: Regex = Regex::new(r"[^a-z\-']").unwrap();

    // Page furniture: bare page numbers in either numbering system.
    static ref DIGITS_ONLY: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref CJK_NUMERALS_ONLY: Regex =
        Regex::new(r"^[一二三四五六七八九十百千]+$").unwrap();
}

/// One morpheme occurrence inside a decomposition, with its gloss fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub morpheme: String,
    pub hint: String,
}

/// One extracted word record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub word: String,
    pub meaning: String,
    pub decomposition: String,
    pub page: usize,
    pub components: Vec<Component>,
}

/// The two line layouts the wordbook uses, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLayout {
    /// `word [decomposition] meaning`
    Bracket,
    /// `word meaning (decomposition)`
    Paren,
}

/// Fields pulled out of a line by one layout, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFields {
    pub word: String,
    pub meaning: String,
    pub decomposition: String,
    pub layout: LineLayout,
}

impl LineLayout {
    /// Priority order for matching. A new layout is one new variant here.
    pub const ORDER: [LineLayout; 2] = [LineLayout::Bracket, LineLayout::Paren];

    /// Try this layout against a normalized line. Field order differs per
    /// layout: Bracket carries the decomposition before the meaning, Paren
    /// carries it trailing in parentheses.
    pub fn capture(self, line: &str) -> Option<LineFields> {
        match self {
            LineLayout::Bracket => {
                let cap = LINE_BRACKET.captures(line)?;
                Some(LineFields {
                    word: normalize_word(&cap[1]),
                    decomposition: normalize_line(&cap[2]),
                    meaning: normalize_line(&cap[3]),
                    layout: self,
                })
            }
            LineLayout::Paren => {
                let cap = LINE_PAREN.captures(line)?;
                Some(LineFields {
                    word: normalize_word(&cap[1]),
                    meaning: normalize_line(&cap[2]),
                    decomposition: normalize_line(&cap[3]),
                    layout: self,
                })
            }
        }
    }
}

/// True for lines that are page furniture rather than content: empty lines
/// and bare page numbers (ASCII digits or CJK numerals). Runs before layout
/// matching so furniture never reaches the patterns.
pub fn is_probably_noise(line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    if DIGITS_ONLY.is_match(line) {
        return true;
    }
    if CJK_NUMERALS_ONLY.is_match(line) {
        return true;
    }
    false
}

/// Match a normalized, non-noise line against the layouts in priority order
/// and return the first hit. Validation happens after, in the scanner: a
/// matched line that fails validation is discarded, not retried against the
/// other layout.
pub fn classify_line(line: &str) -> Option<LineFields> {
    LineLayout::ORDER.iter().find_map(|layout| layout.capture(line))
}

/// Split a decomposition string into ordered components.
///
/// Primary split is on `+` (or its full-width twin); if the string has no
/// plus at all, fall back to comma/semicolon/slash separators. Each piece
/// must open with a Latin token; the token becomes the morpheme (lowercased,
/// boundary hyphens/apostrophes stripped) and the remainder becomes the
/// hint. Morphemes are deduplicated within one decomposition, first
/// occurrence kept.
pub fn parse_components(decomposition: &str) -> Vec<Component> {
    let mut parts: Vec<&str> = decomposition.split(['+', '＋']).collect();
    if parts.len() == 1 {
        parts = decomposition.split(['，', ',', ';', '；', '/']).collect();
    }

    let mut components = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in parts {
        let piece = normalize_line(part);
        if piece.is_empty() {
            continue;
        }
        let cap = match LATIN_TOKEN.captures(&piece) {
            Some(cap) => cap,
            None => continue,
        };
        let lowered = cap[1].to_lowercase();
        let morpheme = lowered.trim_matches(|c| c == '-' || c == '\'');
        if morpheme.is_empty() {
            continue;
        }
        // "a-" is a real single-letter prefix; every other one-char token is
        // OCR noise.
        if morpheme.chars().count() == 1 && morpheme != "a" {
            continue;
        }
        if morpheme.chars().count() > 20 {
            continue;
        }
        if !seen.insert(morpheme.to_string()) {
            continue;
        }
        components.push(Component {
            morpheme: morpheme.to_string(),
            hint: clean_hint(cap.get(2).map_or("", |m| m.as_str())),
        });
    }
    components
}

/// Aggregate counters for one scan run. Outcomes are tallied here instead of
/// logged per line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub pages_scanned: usize,
    pub lines_scanned: usize,
    pub noise_lines: usize,
    pub unmatched_lines: usize,
    pub rejected_words: usize,
    pub empty_decompositions: usize,
    pub duplicate_triples: usize,
    pub bracket_entries: usize,
    pub paren_entries: usize,
}

/// Run-scoped extraction context: entry list, seen-triple set, counters.
/// Construct one per run; ids and first-wins dedup depend on scan order.
pub struct Scanner {
    entries: Vec<Entry>,
    seen: HashSet<(String, String, String)>,
    pub stats: ScanStats,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            entries: Vec::new(),
            seen: HashSet::new(),
            stats: ScanStats::default(),
        }
    }

    /// Scan one page of text, line by line, in document order.
    pub fn scan_page(&mut self, page: usize, text: &str) {
        self.stats.pages_scanned += 1;
        for raw_line in text.lines() {
            self.scan_line(page, raw_line);
        }
    }

    fn scan_line(&mut self, page: usize, raw_line: &str) {
        self.stats.lines_scanned += 1;

        let line = normalize_line(raw_line);
        if is_probably_noise(&line) {
            self.stats.noise_lines += 1;
            return;
        }

        let fields = match classify_line(&line) {
            Some(fields) => fields,
            None => {
                self.stats.unmatched_lines += 1;
                return;
            }
        };

        if fields.word.chars().count() < 2
            || WORD_REJECT.is_match(&fields.word)
            || fields.meaning.is_empty()
            || fields.decomposition.is_empty()
        {
            self.stats.rejected_words += 1;
            return;
        }

        let components = parse_components(&fields.decomposition);
        if components.is_empty() {
            self.stats.empty_decompositions += 1;
            return;
        }

        let key = (
            fields.word.clone(),
            fields.meaning.clone(),
            fields.decomposition.clone(),
        );
        if !self.seen.insert(key) {
            self.stats.duplicate_triples += 1;
            return;
        }

        match fields.layout {
            LineLayout::Bracket => self.stats.bracket_entries += 1,
            LineLayout::Paren => self.stats.paren_entries += 1,
        }
        self.entries.push(Entry {
            id: format!("e{}", self.entries.len() + 1),
            word: fields.word,
            meaning: fields.meaning,
            decomposition: fields.decomposition,
            page,
            components,
        });
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner::new()
    }
}



#[cfg(test)]
mod component_tests {
    use super::*;

    #[test]
    fn plus_split() {
        let components = parse_components("un+believe+able");
        let morphemes: Vec<&str> = components.iter().map(|c| c.morpheme.as_str()).collect();
        assert_eq!(morphemes, vec!["un", "believe", "able"]);
        assert!(components.iter().all(|c| c.hint.is_empty()));
    }

    #[test]
    fn fullwidth_plus_split() {
        let components = parse_components("pre＋dict");
        let morphemes: Vec<&str> = components.iter().map(|c| c.morpheme.as_str()).collect();
        assert_eq!(morphemes, vec!["pre", "dict"]);
    }

    #[test]
    fn comma_fallback_split() {
        let components = parse_components("spect 看，看见");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].morpheme, "spect");
        assert_eq!(components[0].hint, "看");
    }

    #[test]
    fn hints_attach_to_their_morpheme() {
        let components = parse_components("pre 向前+dict 说");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].morpheme, "pre");
        assert_eq!(components[0].hint, "向前");
        assert_eq!(components[1].morpheme, "dict");
        assert_eq!(components[1].hint, "说");
    }

    #[test]
    fn pieces_without_latin_token_are_dropped() {
        let components = parse_components("向前+dict 说");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].morpheme, "dict");
    }

    #[test]
    fn morphemes_deduplicated_first_wins() {
        let components = parse_components("graph 写+graph 图");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].hint, "写");
    }

    #[test]
    fn dedup_is_case_insensitive() {
        let components = parse_components("Graph 写+graph 图");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].morpheme, "graph");
    }

    #[test]
    fn single_letter_a_is_kept() {
        let components = parse_components("a+broad");
        let morphemes: Vec<&str> = components.iter().map(|c| c.morpheme.as_str()).collect();
        assert_eq!(morphemes, vec!["a", "broad"]);
    }

    #[test]
    fn other_single_letters_are_dropped() {
        let components = parse_components("x+port");
        let morphemes: Vec<&str> = components.iter().map(|c| c.morpheme.as_str()).collect();
        assert_eq!(morphemes, vec!["port"]);
    }

    #[test]
    fn boundary_hyphens_and_apostrophes_stripped() {
        let components = parse_components("pre-+dict'");
        assert_eq!(components[0].morpheme, "pre");
        assert_eq!(components[1].morpheme, "dict");
    }

    #[test]
    fn overlong_tokens_are_dropped() {
        let long = "a".repeat(21);
        let components = parse_components(&format!("{long}+dict"));
        let morphemes: Vec<&str> = components.iter().map(|c| c.morpheme.as_str()).collect();
        assert_eq!(morphemes, vec!["dict"]);
    }

    #[test]
    fn empty_decomposition_yields_nothing() {
        assert!(parse_components("").is_empty());
        assert!(parse_components("，，").is_empty());
        assert!(parse_components("前+后").is_empty());
    }
}
