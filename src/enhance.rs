//! AI enhancement stage: metadata enrichment and structural reformatting.
//!
//! Both use sites degrade to the deterministic heuristic path on any AI
//! failure; an import never fails because the model was unreachable or
//! returned garbage. Model output for restructuring is verified against
//! the source with a normalized word-multiset diff, and the quote mandate
//! (quoted text renders as a blockquote) is enforced mechanically after
//! every call: the prompt instruction is a hint, the verification is the
//! contract.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ImportError;
use crate::heuristic;
use crate::model::{ContentBlock, ImportOptions, RawDocument, TextRun};
use crate::normalize;
use crate::openai::{AiConfig, AiError, OpenAiClient, strip_code_fences};

/// Body prefix handed to the metadata prompt, to bound token cost.
const METADATA_BODY_PREFIX_CHARS: usize = 3000;
const CATEGORY_CAP: usize = 3;

pub struct Enhancer {
    client: Option<OpenAiClient>,
}

impl Enhancer {
    /// An enhancer without a client runs the heuristic path for everything.
    pub fn new(config: Option<&AiConfig>) -> Self {
        let client = config.and_then(|config| match OpenAiClient::new(config) {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(%err, "ai client unavailable; using heuristic path");
                None
            }
        });
        Self { client }
    }

    pub fn heuristic_only() -> Self {
        Self { client: None }
    }

    /// Title polish, excerpt synthesis, author detection, and category
    /// suggestion. Returns a new document; the input is never mutated.
    pub async fn enrich_metadata(
        &self,
        doc: &RawDocument,
        options: &ImportOptions,
    ) -> RawDocument {
        match self.try_ai_metadata(doc, options).await {
            Ok(enriched) => enriched,
            Err(err) => {
                if !matches!(err, AiError::Unavailable) {
                    tracing::warn!(%err, "metadata enrichment degraded to heuristics");
                }
                heuristic_metadata(doc, options)
            }
        }
    }

    async fn try_ai_metadata(
        &self,
        doc: &RawDocument,
        options: &ImportOptions,
    ) -> Result<RawDocument, AiError> {
        let client = self.client.as_ref().ok_or(AiError::Unavailable)?;

        let prefix: String = doc.body.chars().take(METADATA_BODY_PREFIX_CHARS).collect();
        let instructions = metadata_instructions(options);
        let input = format!("Title: {}\n\nBody:\n{}", doc.title, prefix);

        let raw = client.complete(&instructions, &input).await?;
        let parsed: AiMetadata = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|err| AiError::CallFailed(format!("parse metadata json: {err}")))?;

        let mut enriched = doc.clone();
        if let Some(title) = parsed.title.map(|t| heuristic::clean_title(&t))
            && !title.is_empty()
        {
            enriched.title = title;
        }
        if options.generate_excerpt {
            enriched.excerpt = parsed
                .excerpt
                .map(|e| heuristic::truncate_with_ellipsis(e.trim(), 500))
                .filter(|e| !e.is_empty())
                .or_else(|| Some(heuristic::generate_excerpt(&doc.body)));
        }
        if options.detect_author && enriched.author.is_none() {
            enriched.author = parsed
                .author
                .map(|a| a.trim().to_owned())
                .filter(|a| !a.is_empty() && a.chars().count() <= 100);
        }
        if options.suggest_categories {
            let known = known_categories(parsed.categories.unwrap_or_default());
            enriched.categories = if known.is_empty() {
                heuristic::suggest_categories(&doc.body)
            } else {
                known
            };
        }

        tracing::debug!(title = %enriched.title, "metadata enriched via ai");
        Ok(enriched)
    }

    /// Convert body text into blocks, preferring the model's structure but
    /// only when it survives the content-preservation diff.
    ///
    /// The only error this can return is `Internal`: the heuristic fallback
    /// violating its own preservation contract is a bug, not an input
    /// condition, and fails loudly instead of emitting corrupted blocks.
    pub async fn restructure(
        &self,
        doc: &RawDocument,
        options: &ImportOptions,
    ) -> Result<Vec<ContentBlock>, ImportError> {
        match self.try_ai_restructure(doc, options).await {
            Ok(blocks) => Ok(enforce_quote_blockquotes(blocks)),
            Err(err) => {
                if !matches!(err, AiError::Unavailable) {
                    tracing::warn!(%err, "restructuring degraded to heuristic segmenter");
                }
                let blocks = normalize::normalize_blocks(&doc.body);
                if blocks.is_empty() && !doc.body.trim().is_empty() {
                    return Err(ImportError::Internal(
                        "normalizer produced no blocks for non-empty body".to_owned(),
                    ));
                }
                if !normalize::preserves_content(&doc.body, &blocks) {
                    return Err(ImportError::Internal(
                        "normalizer violated the content preservation contract".to_owned(),
                    ));
                }
                Ok(blocks)
            }
        }
    }

    async fn try_ai_restructure(
        &self,
        doc: &RawDocument,
        options: &ImportOptions,
    ) -> Result<Vec<ContentBlock>, AiError> {
        let client = self.client.as_ref().ok_or(AiError::Unavailable)?;

        let instructions = restructure_instructions(options);
        let raw = client.complete(&instructions, &doc.body).await?;
        let blocks: Vec<ContentBlock> = serde_json::from_str(strip_code_fences(&raw))
            .map_err(|err| AiError::CallFailed(format!("parse block json: {err}")))?;

        if blocks.is_empty() {
            return Err(AiError::CallFailed("model returned no blocks".to_owned()));
        }
        if !same_word_multiset(&doc.body, &blocks) {
            return Err(AiError::CallFailed(
                "content preservation check failed".to_owned(),
            ));
        }

        tracing::debug!(blocks = blocks.len(), "restructured via ai");
        Ok(blocks)
    }
}

/// The deterministic metadata path, used directly when AI is off and as
/// the landing spot for every AI failure.
pub fn heuristic_metadata(doc: &RawDocument, options: &ImportOptions) -> RawDocument {
    let mut enriched = doc.clone();
    enriched.title = heuristic::clean_title(&doc.title);
    if enriched.title.is_empty() {
        enriched.title = doc.title.clone();
    }
    if options.generate_excerpt && enriched.excerpt.is_none() {
        let excerpt = heuristic::generate_excerpt(&doc.body);
        if !excerpt.is_empty() {
            enriched.excerpt = Some(excerpt);
        }
    }
    if options.suggest_categories && enriched.categories.is_empty() {
        enriched.categories = heuristic::suggest_categories(&doc.body);
    }
    enriched
}

#[derive(Debug, Deserialize)]
struct AiMetadata {
    title: Option<String>,
    excerpt: Option<String>,
    author: Option<String>,
    categories: Option<Vec<String>>,
}

fn known_categories(candidates: Vec<String>) -> Vec<String> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let candidate = candidate.trim();
            heuristic::CATEGORY_BUCKETS
                .iter()
                .map(|(name, _)| *name)
                .find(|name| name.eq_ignore_ascii_case(candidate))
                .map(str::to_owned)
        })
        .take(CATEGORY_CAP)
        .collect()
}

fn metadata_instructions(options: &ImportOptions) -> String {
    let taxonomy = heuristic::CATEGORY_BUCKETS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut instructions = format!(
        "You are an editorial assistant for a ministry leadership journal.\n\
Task: Given an article's title and body, return metadata as a single JSON object.\n\
\n\
Fields:\n\
- \"title\": the title, lightly polished (no rewording beyond cleanup).\n\
- \"excerpt\": a 1-2 sentence summary, at most 500 characters.\n\
- \"author\": the author's name if stated in the text, else null.\n\
- \"categories\": 2-3 labels chosen ONLY from: {taxonomy}.\n\
\n\
Hard rules:\n\
- Output ONLY the JSON object. No commentary, no code fences.\n\
- Never invent an author.\n\
- Never use a category outside the list.\n"
    );
    if let Some(custom) = options.custom_prompt.as_deref() {
        instructions.push_str("\nAdditional editorial guidance (must not override the hard rules):\n");
        instructions.push_str(custom);
        instructions.push('\n');
    }
    instructions
}

fn restructure_instructions(options: &ImportOptions) -> String {
    let mut instructions = "You are a formatting engine for a magazine CMS.\n\
Task: Convert the input plain text into a JSON array of content blocks.\n\
\n\
Block shapes:\n\
- {\"type\":\"heading\",\"level\":1-6,\"text\":\"...\"}\n\
- {\"type\":\"paragraph\",\"runs\":[{\"text\":\"...\",\"emphasis\":\"bold\"|\"italic\"}]} (omit emphasis for plain runs)\n\
- {\"type\":\"blockquote\",\"paragraphs\":[[{\"text\":\"...\"}]]}\n\
- {\"type\":\"list\",\"ordered\":true|false,\"items\":[[{\"text\":\"...\"}]]}\n\
\n\
Hard rules:\n\
- Do NOT add, remove, or change any words. Only structure may be added.\n\
- Every piece of input text must appear in exactly one block, in order.\n\
- Any text wrapped in quotation marks MUST become a blockquote.\n\
- Output ONLY the JSON array. No commentary, no code fences.\n"
        .to_owned();
    if let Some(custom) = options.custom_prompt.as_deref() {
        instructions.push_str("\nAdditional formatting guidance (must not override the hard rules):\n");
        instructions.push_str(custom);
        instructions.push('\n');
    }
    instructions
}

/// Normalized word-multiset diff between source text and block output.
/// Order is not compared here (the model may hoist a title); words must
/// match one-for-one ignoring case and structural decoration.
fn same_word_multiset(source: &str, blocks: &[ContentBlock]) -> bool {
    fn counts(words: Vec<String>) -> HashMap<String, usize> {
        let mut map = HashMap::new();
        for word in words {
            *map.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        map
    }

    counts(normalize::content_words(source))
        == counts(normalize::content_words(&normalize::reconstruct_text(blocks)))
}

/// The quote mandate, applied mechanically: any non-quote block whose text
/// sits in quotation marks becomes a blockquote, whatever the model said.
pub fn enforce_quote_blockquotes(blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    blocks
        .into_iter()
        .map(|block| {
            let text = match &block {
                ContentBlock::Paragraph { runs } => runs
                    .iter()
                    .map(|r| r.text.as_str())
                    .collect::<String>(),
                ContentBlock::Heading { text, .. } => text.clone(),
                _ => return block,
            };
            let trimmed = text.trim();
            if is_fully_quoted(trimmed) {
                ContentBlock::Blockquote {
                    paragraphs: vec![vec![TextRun::plain(trimmed)]],
                }
            } else {
                block
            }
        })
        .collect()
}

fn is_fully_quoted(text: &str) -> bool {
    const OPENERS: [char; 3] = ['"', '\u{201c}', '\u{2018}'];
    const CLOSERS: [char; 3] = ['"', '\u{201d}', '\u{2019}'];
    let mut chars = text.chars();
    match (chars.next(), chars.last()) {
        (Some(first), Some(last)) => OPENERS.contains(&first) && CLOSERS.contains(&last),
        _ => false,
    }
}
