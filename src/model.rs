use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intermediate representation produced by extraction and consumed by the
/// enhancement stage. A valid document always has a non-empty trimmed
/// `title` and `body`; everything else is optional enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub title: String,
    /// Plain text with paragraphs separated by blank lines.
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<ExtractedImage>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub word_count: usize,
    pub reading_time_minutes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl DocumentMetadata {
    pub fn for_body(body: &str, source_url: Option<String>) -> Self {
        let word_count = count_words(body);
        Self {
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
            source_url,
            extracted_at: Utc::now(),
        }
    }
}

/// An image reference discovered during extraction. `url` is absolute,
/// already resolved against the source page's base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A typed structural unit of the final document model. Block order is
/// reading order and must match the paragraph order of the source body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<TextRun> },
    Blockquote { paragraphs: Vec<Vec<TextRun>> },
    List { ordered: bool, items: Vec<Vec<TextRun>> },
    Image { url: String, alt: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Emphasis::is_none")]
    pub emphasis: Emphasis,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    #[default]
    None,
    Bold,
    Italic,
}

impl Emphasis {
    pub fn is_none(&self) -> bool {
        matches!(self, Emphasis::None)
    }
}

/// Per-request knobs for the import pipeline. Every toggle defaults to
/// enabled; `custom_prompt` is appended to the AI instructions but cannot
/// override the content-preservation rules (those are re-verified after
/// every model call).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    pub generate_excerpt: bool,
    pub detect_author: bool,
    pub extract_images: bool,
    pub suggest_categories: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            generate_excerpt: true,
            detect_author: true,
            extract_images: true,
            suggest_categories: true,
            custom_prompt: None,
        }
    }
}

/// Words are whitespace-separated runs with at least one alphanumeric char.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// 200 words per minute, rounded up, never below one minute.
pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(200).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_words_skips_bare_punctuation() {
        assert_eq!(count_words("hello, world -- twice"), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn reading_time_rounds_up_with_floor_of_one() {
        assert_eq!(reading_time_minutes(0), 1);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(1000), 5);
    }

    #[test]
    fn content_block_serializes_with_type_tag() {
        let block = ContentBlock::Heading {
            level: 2,
            text: "Why It Matters".to_owned(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
    }
}
