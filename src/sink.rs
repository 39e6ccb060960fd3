//! The egress side of the pipeline: the finished post record, slug
//! derivation, and the storage collaborator trait.
//!
//! The sink is deliberately a black box: one atomic write per finished
//! import, no interim persistence. Slug collisions are the sink's problem
//! (it may suffix a timestamp); this side only guarantees a deterministic,
//! collision-naive slug.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ImportError;
use crate::model::ContentBlock;

pub const SLUG_MAX_CHARS: usize = 96;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub slug: String,
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub word_count: usize,
    pub reading_time_minutes: usize,
    pub status: String,
    pub imported_at: DateTime<Utc>,
}

#[async_trait]
pub trait PostSink: Send + Sync {
    async fn write_post(&self, record: &PostRecord) -> Result<(), ImportError>;
}

/// Lowercase, keep alphanumerics, spaces to hyphens, collapse and trim
/// hyphens, cap at 96 chars. Idempotent: slugify(slugify(t)) == slugify(t).
/// A title with no alphanumerics at all falls back to a fixed stem so the
/// sink never writes a nameless file.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_hyphen = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
        // Every other character is dropped.
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.chars().count() > SLUG_MAX_CHARS {
        slug = slug.chars().take(SLUG_MAX_CHARS).collect();
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        return "untitled".to_owned();
    }
    slug
}

/// Writes each post as pretty JSON under a directory, named by slug.
/// The write is atomic: tmp file plus rename.
#[derive(Debug, Clone)]
pub struct LocalJsonSink {
    base_dir: PathBuf,
}

impl LocalJsonSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn post_path(&self, slug: &str) -> PathBuf {
        self.base_dir.join(format!("{slug}.json"))
    }
}

#[async_trait]
impl PostSink for LocalJsonSink {
    async fn write_post(&self, record: &PostRecord) -> Result<(), ImportError> {
        let path = self.post_path(&record.slug);
        write_json_atomic(&path, record).await?;
        tracing::info!(slug = %record.slug, path = %path.display(), "post written");
        Ok(())
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ImportError> {
    let parent = path
        .parent()
        .ok_or_else(|| ImportError::Internal(format!("path has no parent: {}", path.display())))?;
    fs::create_dir_all(parent)
        .await
        .map_err(|err| ImportError::Internal(format!("create sink dir: {err}")))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value)
        .map_err(|err| ImportError::Internal(format!("serialize post record: {err}")))?;
    fs::write(&tmp_path, &data)
        .await
        .map_err(|err| ImportError::Internal(format!("write tmp post: {err}")))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|err| ImportError::Internal(format!("rename tmp post: {err}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Leading  and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("Faith & Works: A Study"), "faith-works-a-study");
    }

    #[test]
    fn slugify_is_idempotent() {
        let once = slugify("The 7 Habits of Godly Leaders!");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn slugify_of_pure_punctuation_falls_back_to_untitled() {
        assert_eq!(slugify("???"), "untitled");
        assert_eq!(slugify("  --  "), "untitled");
        assert_eq!(slugify("untitled"), "untitled");
    }

    #[test]
    fn slugify_caps_length_without_trailing_hyphen() {
        let title = "word ".repeat(40);
        let slug = slugify(&title);
        assert!(slug.chars().count() <= SLUG_MAX_CHARS);
        assert!(!slug.ends_with('-'));
        assert!(!slug.starts_with('-'));
    }

    #[tokio::test]
    async fn local_sink_writes_readable_json() {
        let temp = tempfile::TempDir::new().unwrap();
        let sink = LocalJsonSink::new(temp.path());

        let record = PostRecord {
            title: "A Post".to_owned(),
            slug: "a-post".to_owned(),
            content: vec![ContentBlock::Paragraph {
                runs: vec![TextRun::plain("Body.")],
            }],
            excerpt: None,
            cover_image: None,
            author: None,
            categories: vec!["Ministry".to_owned()],
            word_count: 1,
            reading_time_minutes: 1,
            status: "draft".to_owned(),
            imported_at: Utc::now(),
        };
        sink.write_post(&record).await.unwrap();

        let raw = std::fs::read_to_string(sink.post_path("a-post")).unwrap();
        let parsed: PostRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.slug, "a-post");
        assert_eq!(parsed.content.len(), 1);
    }
}
