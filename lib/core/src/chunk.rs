//! Syllabus text chunking
//!
//! Text is split before heading lines, tiny sections are discarded and the
//! rest is packed greedily into bounded chunks. Lengths are counted in chars.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Upper bound on a packed chunk
    pub max_chars: usize,
    /// Sections shorter than this are dropped before packing
    pub min_section_chars: usize,
    /// Chunks of this length or less are dropped after packing
    pub min_chunk_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            min_section_chars: 100,
            min_chunk_chars: 200,
        }
    }
}

/// Runs of spaces and tabs; newlines are structure and stay
static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid whitespace pattern"));

/// `TOPIC NAME:` style label, or a numbered heading like `3 Neural Networks`
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Z][A-Z\s]{3,}:|\d+\s+[A-Z])").expect("valid heading pattern"));

/// Collapse runs of spaces and tabs, keep line structure
pub fn clean_text(text: &str) -> String {
    INLINE_SPACE.replace_all(text, " ").trim().to_string()
}

fn is_heading(line: &str) -> bool {
    HEADING.is_match(line)
}

fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for (i, line) in text.lines().enumerate() {
        if i > 0 && is_heading(line) {
            sections.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    sections.push(current);
    sections
}

/// Split raw syllabus text into embedding units
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    let text = clean_text(text);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for section in split_sections(&text) {
        let section = section.trim();
        let section_len = section.chars().count();
        if section.is_empty() || section_len < config.min_section_chars {
            continue;
        }

        if current_len + section_len <= config.max_chars {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(section);
            current_len += section_len;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current = section.to_string();
            current_len = section_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.retain(|c| c.chars().count() > config.min_chunk_chars);
    chunks
}
