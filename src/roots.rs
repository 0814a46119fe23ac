//! Root/affix aggregation over the finished entry list.
//!
//! One pass tallies morpheme occurrences, hint frequencies, and first-seen
//! example words; a second pass filters by the occurrence threshold, picks a
//! best gloss per root, and emits the sorted index.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::normalize::{has_cjk, has_latin};
use crate::scan::Entry;

/// A morpheme must occur in at least this many entries to make the index.
const MIN_OCCURRENCES: usize = 2;

/// Restricted gloss candidates may be at most this many characters.
const MAX_GLOSS_CHARS: usize = 18;

/// Example-word lists are truncated to this many words at emission.
const SAMPLE_WORD_CAP: usize = 12;

/// One aggregated root with its chosen gloss and example words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootEntry {
    pub root: String,
    pub gloss: String,
    pub word_count: usize,
    pub sample_words: Vec<String>,
}

#[derive(Default)]
struct RootTally {
    occurrences: usize,
    hints: HashMap<String, usize>,
    // Vec + set pair: first-seen order of example words is load-bearing.
    words: Vec<String>,
    words_seen: HashSet<String>,
}

/// Build the sorted root index from the finished entry list.
pub fn build_root_index(entries: &[Entry]) -> Vec<RootEntry> {
    let mut tallies: HashMap<String, RootTally> = HashMap::new();

    for entry in entries {
        for component in &entry.components {
            let tally = tallies.entry(component.morpheme.clone()).or_default();
            tally.occurrences += 1;
            if !component.hint.is_empty() {
                *tally.hints.entry(component.hint.clone()).or_insert(0) += 1;
            }
            if tally.words_seen.insert(entry.word.clone()) {
                tally.words.push(entry.word.clone());
            }
        }
    }

    let mut roots: Vec<RootEntry> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.occurrences >= MIN_OCCURRENCES)
        .map(|(root, tally)| RootEntry {
            root,
            gloss: select_gloss(&tally.hints),
            word_count: tally.words.len(),
            sample_words: tally.words.iter().take(SAMPLE_WORD_CAP).cloned().collect(),
        })
        .collect();

    roots.sort_by(|a, b| {
        b.word_count
            .cmp(&a.word_count)
            .then_with(|| a.root.cmp(&b.root))
    });
    roots
}

/// Pick the best gloss for one root from its hint-frequency table.
///
/// The restricted pool keeps hints that look like clean CJK gloss text
/// (contain CJK, at most 18 chars, no Latin). If nothing qualifies, fall
/// back to the full table so a root with only messy hints still gets one.
/// Ranking: CJK-bearing first, then most frequent, shortest, lexicographic.
fn select_gloss(hints: &HashMap<String, usize>) -> String {
    if hints.is_empty() {
        return String::new();
    }

    let mut pool: Vec<(&str, usize)> = hints
        .iter()
        .filter(|(hint, _)| {
            has_cjk(hint) && hint.chars().count() <= MAX_GLOSS_CHARS && !has_latin(hint)
        })
        .map(|(hint, &freq)| (hint.as_str(), freq))
        .collect();
    if pool.is_empty() {
        pool = hints.iter().map(|(hint, &freq)| (hint.as_str(), freq)).collect();
    }

    pool.sort_by(|&(hint_a, freq_a), &(hint_b, freq_b)| {
        (!has_cjk(hint_a))
            .cmp(&!has_cjk(hint_b))
            .then_with(|| freq_b.cmp(&freq_a))
            .then_with(|| hint_a.chars().count().cmp(&hint_b.chars().count()))
            .then_with(|| hint_a.cmp(hint_b))
    });
    pool[0].0.to_string()
}
