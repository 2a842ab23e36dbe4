//! Semantic chunk emission.
//!
//! Walks the sentence stream in order, labeling each sentence with its
//! paragraph, section, and semantic group, and accumulates sentences into a
//! running buffer. The buffer is flushed into a chunk whenever a section
//! header arrives, the semantic group or paragraph changes, or appending the
//! next sentence would exceed the chunk character budget. Header sentences
//! are emitted as their own chunks with maximal importance.

use tracing::debug;

use plenum_core::defaults;

use crate::labels::{detect_header, extract_entities, semantic_group};
use crate::sentence::{split_sentences, SentenceSpan};

/// Configuration for the segmenter.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Maximum characters per chunk; the buffer flushes before exceeding it.
    pub max_chunk_size: usize,
    /// Soft minimum characters per chunk. A target only; never enforced.
    pub min_chunk_size: usize,
    /// Overlap characters between adjacent chunks. Carried for the storage
    /// collaborator's configuration surface; semantic chunks are disjoint.
    pub overlap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: defaults::CHUNK_MAX_SIZE,
            min_chunk_size: defaults::CHUNK_MIN_SIZE,
            overlap: defaults::CHUNK_OVERLAP,
        }
    }
}

/// An emitted chunk, not yet persisted or embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// 1-based emission order.
    pub sequence_number: i32,
    pub content: String,
    pub section_title: Option<String>,
    pub is_section_header: bool,
    pub paragraph_id: Option<i32>,
    pub semantic_group: Option<String>,
    /// Importance in [0, 1]; headers are always 1.0.
    pub importance_score: f32,
}

/// Per-sentence annotation computed before emission.
struct Annotated {
    text: String,
    header_title: Option<String>,
    paragraph_id: i32,
    group: String,
    entity_count: usize,
}

/// Paragraph break when two or more whitespace characters (a blank line or
/// larger gap) separate consecutive sentence spans.
const PARAGRAPH_GAP: usize = 2;

/// Splits document text into ordered, metadata-bearing segments.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a segmenter with the given configuration.
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Get the configuration used by this segmenter.
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `text` into ordered chunks.
    ///
    /// Whitespace-only input yields no segments. Input with no sentence
    /// boundaries yields a single segment covering the whole text.
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        let sentences = self.annotate(split_sentences(text));
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut emitter = Emitter::new(self.config.max_chunk_size);
        for sentence in sentences {
            emitter.push(sentence);
        }
        let segments = emitter.finish();

        debug!(
            chunk_count = segments.len(),
            max_chunk_size = self.config.max_chunk_size,
            "Segmented document"
        );
        segments
    }

    fn annotate(&self, spans: Vec<SentenceSpan>) -> Vec<Annotated> {
        let mut out = Vec::with_capacity(spans.len());
        let mut paragraph_id = 1;
        let mut previous_end: Option<usize> = None;

        for span in spans {
            if let Some(end) = previous_end {
                if span.start.saturating_sub(end) >= PARAGRAPH_GAP {
                    paragraph_id += 1;
                }
            }
            previous_end = Some(span.end);

            let header_title = detect_header(&span.text);
            let group = if header_title.is_some() {
                defaults::SECTION_HEADER_GROUP.to_string()
            } else {
                semantic_group(&span.text)
            };
            out.push(Annotated {
                entity_count: extract_entities(&span.text).len(),
                text: span.text,
                header_title,
                paragraph_id,
                group,
            });
        }
        out
    }
}

/// Accumulates annotated sentences and flushes them into segments.
struct Emitter {
    max_chunk_size: usize,
    segments: Vec<Segment>,
    buffer: Vec<String>,
    buffer_entities: usize,
    buffer_len: usize,
    current_group: Option<String>,
    current_paragraph: Option<i32>,
    current_section: Option<String>,
}

impl Emitter {
    fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size,
            segments: Vec::new(),
            buffer: Vec::new(),
            buffer_entities: 0,
            buffer_len: 0,
            current_group: None,
            current_paragraph: None,
            current_section: None,
        }
    }

    fn push(&mut self, sentence: Annotated) {
        if let Some(title) = sentence.header_title {
            self.flush();
            self.emit_header(&sentence.text, sentence.paragraph_id);
            self.current_section = Some(title);
            self.current_group = None;
            self.current_paragraph = Some(sentence.paragraph_id);
            return;
        }

        let group_changed = self
            .current_group
            .as_ref()
            .is_some_and(|g| *g != sentence.group);
        let paragraph_changed = self
            .current_paragraph
            .is_some_and(|p| p != sentence.paragraph_id);
        let over_budget = !self.buffer.is_empty()
            && self.buffer_len + 1 + sentence.text.len() > self.max_chunk_size;

        if !self.buffer.is_empty() && (group_changed || paragraph_changed || over_budget) {
            self.flush();
        }

        self.buffer_len += if self.buffer.is_empty() {
            sentence.text.len()
        } else {
            1 + sentence.text.len()
        };
        self.buffer.push(sentence.text);
        self.buffer_entities += sentence.entity_count;
        self.current_group = Some(sentence.group);
        self.current_paragraph = Some(sentence.paragraph_id);
    }

    fn emit_header(&mut self, text: &str, paragraph_id: i32) {
        self.segments.push(Segment {
            sequence_number: self.segments.len() as i32 + 1,
            content: text.to_string(),
            section_title: Some(text.to_string()),
            is_section_header: true,
            paragraph_id: Some(paragraph_id),
            semantic_group: Some(defaults::SECTION_HEADER_GROUP.to_string()),
            importance_score: 1.0,
        });
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let entity_density = self.buffer_entities as f32 / self.buffer.len() as f32;
        let section_bonus = if self.current_section.is_some() { 1.0 } else { 0.0 };
        let importance = (0.5 * entity_density + 0.5 * section_bonus).min(1.0);

        self.segments.push(Segment {
            sequence_number: self.segments.len() as i32 + 1,
            content: self.buffer.join(" "),
            section_title: self.current_section.clone(),
            is_section_header: false,
            paragraph_id: self.current_paragraph,
            semantic_group: self.current_group.take(),
            importance_score: importance,
        });
        self.buffer.clear();
        self.buffer_entities = 0;
        self.buffer_len = 0;
    }

    fn finish(mut self) -> Vec<Segment> {
        self.flush();
        self.segments
    }
}
