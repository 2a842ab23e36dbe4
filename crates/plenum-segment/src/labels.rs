//! Structural and semantic labeling heuristics.
//!
//! Header detection and semantic grouping run on plain token patterns, so
//! segmentation needs no NLP runtime. The heuristics approximate what a
//! named-entity tagger would produce: capitalized spans stand in for named
//! entities, and a leading noun-phrase guess labels sentences that carry no
//! entity at all.

use regex::Regex;
use std::sync::OnceLock;

use plenum_core::defaults;

fn header_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Numbered ("3. "), lettered ("B. "), and word-number ("Chapter 2:",
    // "Section 4:", "Part 1:") heading prefixes.
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:\d+\.\s+|[a-z]\.\s+|[a-z]+\s+\d+:)\s*(.*)$").unwrap()
    })
}

/// Detect whether a sentence looks like a section header.
///
/// Returns the header title (prefix and trailing colon stripped) when the
/// sentence matches any of: a heading prefix pattern, an all-caps line under
/// [`defaults::HEADER_MAX_LEN`] characters, or a short line ending in a
/// colon.
pub fn detect_header(sentence: &str) -> Option<String> {
    if let Some(caps) = header_prefix_regex().captures(sentence) {
        let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if !title.is_empty() {
            return Some(title.trim_end_matches(':').trim().to_string());
        }
    }

    if sentence.len() < defaults::HEADER_MAX_LEN && is_all_caps(sentence) {
        return Some(sentence.to_string());
    }

    if sentence.len() < defaults::HEADER_MAX_LEN && sentence.ends_with(':') {
        return Some(sentence.trim_end_matches(':').trim().to_string());
    }

    None
}

/// Python-style `isupper`: at least one cased character, and every cased
/// character is uppercase.
fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Extract heuristic entity spans from a sentence.
///
/// An entity is a run of capitalized words; a run anchored at the sentence
/// start must be at least two words long, since the first word is
/// capitalized regardless of what it names.
pub fn extract_entities(sentence: &str) -> Vec<String> {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    let mut entities = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 0;

    for (i, word) in words.iter().enumerate() {
        if is_capitalized_word(word) {
            if run.is_empty() {
                run_start = i;
            }
            run.push(trim_word(word));
        } else {
            flush_run(&mut run, run_start, &mut entities);
        }
    }
    flush_run(&mut run, run_start, &mut entities);

    entities
}

fn flush_run(run: &mut Vec<&str>, run_start: usize, entities: &mut Vec<String>) {
    if !run.is_empty() && (run_start > 0 || run.len() >= 2) {
        entities.push(run.join(" "));
    }
    run.clear();
}

fn is_capitalized_word(word: &str) -> bool {
    let trimmed = trim_word(word);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.is_uppercase() && trimmed.chars().skip(1).all(|c| c.is_alphanumeric()),
        None => false,
    }
}

fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "its", "his", "her", "their", "our",
    "my", "your", "some", "any", "each", "every",
];

const VERB_STOPS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "has", "have", "had", "will", "would", "can",
    "could", "may", "might", "should", "must", "do", "does", "did",
];

/// Assign a semantic-group label to a sentence.
///
/// Entity-bearing sentences are labeled by their first entity; otherwise the
/// leading noun phrase (determiners skipped, cut at the first verb-like
/// word, at most three words); otherwise the general-content bucket.
pub fn semantic_group(sentence: &str) -> String {
    if let Some(entity) = extract_entities(sentence).into_iter().next() {
        return format!("Topic: {}", entity);
    }

    let phrase: Vec<&str> = sentence
        .split_whitespace()
        .map(trim_word)
        .filter(|w| !w.is_empty())
        .skip_while(|w| DETERMINERS.contains(&w.to_lowercase().as_str()))
        .take_while(|w| !VERB_STOPS.contains(&w.to_lowercase().as_str()))
        .take(3)
        .collect();

    if phrase.is_empty() {
        defaults::GENERAL_CONTENT_GROUP.to_string()
    } else {
        format!("Topic: {}", phrase.join(" "))
    }
}
