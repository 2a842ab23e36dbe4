//! Sentence splitting with positional spans.
//!
//! Splits at sentence-ending punctuation, avoiding common abbreviations and
//! decimal numbers, and treats line breaks as hard boundaries so headings
//! without terminal punctuation become their own sentences. Spans carry byte
//! offsets of the trimmed content so the segmenter can apply its paragraph
//! gap heuristic to the whitespace between consecutive sentences.

use regex::Regex;
use std::sync::OnceLock;

/// A trimmed sentence with its byte span in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    /// Trimmed sentence text.
    pub text: String,
    /// Byte offset of the first content character in the source text.
    pub start: usize,
    /// Byte offset one past the last content character in the source text.
    pub end: usize,
}

fn boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)").unwrap())
}

fn abbreviation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Single letters cover initials ("J. Smith") and lettered headings.
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:dr|mr|mrs|ms|prof|sr|jr|inc|ltd|co|etc|vs|e\.g|i\.e|[a-z])\.$")
            .unwrap()
    })
}

/// Split `text` into trimmed sentences with byte spans.
///
/// Empty and whitespace-only candidates are dropped. Text with no sentence
/// boundaries at all yields a single span covering the whole content.
pub fn split_sentences(text: &str) -> Vec<SentenceSpan> {
    let mut spans = Vec::new();
    let mut line_start = 0;

    for line in text.split_inclusive('\n') {
        split_line(line, line_start, &mut spans);
        line_start += line.len();
    }

    spans
}

/// Split one line at punctuation boundaries, pushing trimmed spans.
fn split_line(line: &str, line_offset: usize, spans: &mut Vec<SentenceSpan>) {
    let mut last_end = 0;

    for mat in boundary_regex().find_iter(line) {
        let candidate = &line[last_end..mat.end()];

        if abbreviation_regex().is_match(candidate.trim_end()) {
            continue;
        }

        // A digit before the punctuation is likely a decimal or a numbered
        // heading prefix, not a sentence end.
        if line[..mat.start()]
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_digit())
        {
            continue;
        }

        push_trimmed(line, last_end, mat.end(), line_offset, spans);
        last_end = mat.end();
    }

    if last_end < line.len() {
        push_trimmed(line, last_end, line.len(), line_offset, spans);
    }
}

fn push_trimmed(
    line: &str,
    start: usize,
    end: usize,
    line_offset: usize,
    spans: &mut Vec<SentenceSpan>,
) {
    let raw = &line[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    let content_start = start + lead;
    spans.push(SentenceSpan {
        text: trimmed.to_string(),
        start: line_offset + content_start,
        end: line_offset + content_start + trimmed.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic_sentences() {
        let spans = split_sentences("First sentence. Second sentence! Third?");
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["First sentence.", "Second sentence!", "Third?"]
        );
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let spans = split_sentences("Dr. Smith arrived. He sat down.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Dr. Smith arrived.");
    }

    #[test]
    fn test_decimals_do_not_split() {
        let spans = split_sentences("The rate rose 3.5 percent. Analysts agreed.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "The rate rose 3.5 percent.");
    }

    #[test]
    fn test_numbered_heading_stays_whole() {
        let spans = split_sentences("1. Introduction\nBody text here.");
        assert_eq!(spans[0].text, "1. Introduction");
        assert_eq!(spans[1].text, "Body text here.");
    }

    #[test]
    fn test_line_break_is_hard_boundary() {
        let spans = split_sentences("HEADING\nFirst sentence.");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "HEADING");
    }

    #[test]
    fn test_spans_track_offsets() {
        let text = "One. Two.";
        let spans = split_sentences(text);
        assert_eq!(&text[spans[0].start..spans[0].end], "One.");
        assert_eq!(&text[spans[1].start..spans[1].end], "Two.");
    }

    #[test]
    fn test_blank_line_gap_visible_in_spans() {
        let text = "One.\n\nTwo.";
        let spans = split_sentences(text);
        assert_eq!(spans.len(), 2);
        // The gap between spans covers the two newline characters.
        assert_eq!(spans[1].start - spans[0].end, 2);
    }

    #[test]
    fn test_whitespace_only_candidates_dropped() {
        let spans = split_sentences("One.   \n   \nTwo.");
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_no_boundaries_yields_single_span() {
        let spans = split_sentences("no punctuation at all just words");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "no punctuation at all just words");
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t  ").is_empty());
    }
}
