//! The import pipeline: one request runs gate, fetch/admit, extract,
//! validate, and enhance as a sequential chain, then hands a finished
//! document to `publish` for normalization and the single atomic sink
//! write. Dropping the returned future cancels any in-flight fetch or AI
//! call; nothing is persisted until the final write.

use std::sync::Arc;

use crate::binary;
use crate::enhance::Enhancer;
use crate::error::ImportError;
use crate::extract;
use crate::fetch::{self, FetchConfig};
use crate::html;
use crate::model::{ImportOptions, RawDocument};
use crate::openai::AiConfig;
use crate::ratelimit::{FixedWindowLimiter, ImportAction, RateLimiter};
use crate::sink::{PostRecord, PostSink, slugify};
use crate::validate;

pub struct Importer {
    fetch_config: FetchConfig,
    enhancer: Enhancer,
    limiter: Arc<dyn RateLimiter>,
}

impl Importer {
    pub fn new(
        fetch_config: FetchConfig,
        ai_config: Option<&AiConfig>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            fetch_config,
            enhancer: Enhancer::new(ai_config),
            limiter,
        }
    }

    /// Production wiring: strict fetch defaults, AI from the environment,
    /// hourly in-memory limits.
    pub fn from_env() -> Self {
        Self::new(
            FetchConfig::default(),
            AiConfig::from_env().as_ref(),
            Arc::new(FixedWindowLimiter::hourly()),
        )
    }

    pub async fn import_from_url(
        &self,
        client_id: &str,
        url: &str,
        options: &ImportOptions,
    ) -> Result<RawDocument, ImportError> {
        self.gate(client_id, ImportAction::UrlImport)?;

        let page = fetch::fetch_url(url, &self.fetch_config).await?;
        let doc = html::extract_html(&page.markup, &page.base_url, options);
        validate::validate_document(&doc)?;

        let doc = self.enhancer.enrich_metadata(&doc, options).await;
        tracing::info!(url = %page.base_url, title = %doc.title, "url import complete");
        Ok(doc)
    }

    pub async fn import_from_text(
        &self,
        client_id: &str,
        text: &str,
        title: Option<&str>,
        options: &ImportOptions,
    ) -> Result<RawDocument, ImportError> {
        self.gate(client_id, ImportAction::TextImport)?;

        let text = fetch::accept_text(text)?;
        validate::validate_text(&text)?;

        let doc = extract::extract_text(&text, title, options);
        validate::validate_document(&doc)?;

        let doc = self.enhancer.enrich_metadata(&doc, options).await;
        tracing::info!(title = %doc.title, "text import complete");
        Ok(doc)
    }

    pub async fn import_from_file(
        &self,
        client_id: &str,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
        options: &ImportOptions,
    ) -> Result<RawDocument, ImportError> {
        self.gate(client_id, ImportAction::FileImport)?;

        let bytes = fetch::accept_file(filename, mime_type, bytes)?;
        let doc = binary::extract_file(filename, mime_type, bytes, options)?;
        validate::validate_document(&doc)?;

        let doc = self.enhancer.enrich_metadata(&doc, options).await;
        tracing::info!(filename = %filename, title = %doc.title, "file import complete");
        Ok(doc)
    }

    /// Normalize a finished document to blocks and write it once,
    /// atomically, to the sink.
    pub async fn publish(
        &self,
        client_id: &str,
        doc: &RawDocument,
        options: &ImportOptions,
        sink: &dyn PostSink,
    ) -> Result<PostRecord, ImportError> {
        self.gate(client_id, ImportAction::CreatePost)?;
        validate::validate_document(doc)?;

        let content = self.enhancer.restructure(doc, options).await?;

        let record = PostRecord {
            title: doc.title.clone(),
            slug: slugify(&doc.title),
            content,
            excerpt: doc.excerpt.clone(),
            cover_image: doc.images.first().map(|image| image.url.clone()),
            author: doc.author.clone(),
            categories: doc.categories.clone(),
            word_count: doc.metadata.word_count,
            reading_time_minutes: doc.metadata.reading_time_minutes,
            status: "draft".to_owned(),
            imported_at: chrono::Utc::now(),
        };

        sink.write_post(&record).await?;
        Ok(record)
    }

    fn gate(&self, client_id: &str, action: ImportAction) -> Result<(), ImportError> {
        if self.limiter.try_consume(client_id, action) {
            return Ok(());
        }
        Err(ImportError::RateLimited {
            action: action.name(),
            limit: action.hourly_limit(),
        })
    }
}
