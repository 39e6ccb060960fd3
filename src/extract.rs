//! Plain-text extraction: the path for pasted text, with title derivation
//! when the caller did not supply one. The HTML and binary paths live in
//! `html` and `binary`; metrics are computed identically across all three.

use crate::heuristic::truncate_with_ellipsis;
use crate::model::{DocumentMetadata, ImportOptions, RawDocument};

const DERIVED_TITLE_MAX_CHARS: usize = 100;

pub fn extract_text(text: &str, title: Option<&str>, _options: &ImportOptions) -> RawDocument {
    let body = text.trim().to_owned();

    let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(given) => given.to_owned(),
        None => derive_title(&body),
    };

    RawDocument {
        title,
        metadata: DocumentMetadata::for_body(&body, None),
        body,
        excerpt: None,
        author: None,
        published_at: None,
        images: Vec::new(),
        categories: Vec::new(),
    }
}

/// First non-empty line, capped at 100 chars with an ellipsis.
fn derive_title(body: &str) -> String {
    let first_line = body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Untitled");
    truncate_with_ellipsis(first_line, DERIVED_TITLE_MAX_CHARS)
}
