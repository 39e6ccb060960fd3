//! HTML structural extraction: title, body text, images, author, and
//! publish date out of arbitrary page markup.
//!
//! Selector cascades are ordered most-specific-first; the first non-empty
//! match wins. Body conversion walks the chosen container and turns
//! block-level boundaries into blank-line paragraph breaks so the
//! normalizer downstream sees the same segmentation a reader would.

use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::model::{DocumentMetadata, ExtractedImage, ImportOptions, RawDocument};

const FALLBACK_TITLE: &str = "Untitled Article";

const BODY_SELECTORS: [&str; 7] = [
    "article",
    ".entry-content",
    ".post-content",
    ".article-content",
    ".content",
    "main",
    ".main-content",
];

const AUTHOR_SELECTORS: [&str; 5] = [
    "[rel=\"author\"]",
    ".author",
    ".byline",
    ".post-author",
    ".entry-author",
];

const DATE_SELECTORS: [&str; 3] = [".published", ".post-date", ".entry-date"];

const STRIP_TAGS: [&str; 8] = [
    "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe",
];

const STRIP_CLASS_HINTS: [&str; 6] = [
    "sidebar",
    "advert",
    "ad-container",
    "promo",
    "social-share",
    "comments",
];

pub fn extract_html(markup: &str, base_url: &Url, options: &ImportOptions) -> RawDocument {
    let document = Html::parse_document(markup);

    let title = extract_title(&document);
    let body = extract_body_text(&document);
    let images = if options.extract_images {
        extract_images(&document, base_url)
    } else {
        Vec::new()
    };
    let author = if options.detect_author {
        extract_author(&document)
    } else {
        None
    };
    let published_at = extract_published_at(&document);

    tracing::debug!(
        url = %base_url,
        title = %title,
        body_chars = body.len(),
        images = images.len(),
        "extracted html document"
    );

    RawDocument {
        title,
        metadata: DocumentMetadata::for_body(&body, Some(base_url.to_string())),
        body,
        excerpt: None,
        author,
        published_at,
        images,
        categories: Vec::new(),
    }
}

fn selector(css: &str) -> Selector {
    // All selectors in this module are static strings; a parse failure is a
    // programming error, not an input condition.
    Selector::parse(css).expect("static css selector")
}

fn extract_title(document: &Html) -> String {
    for css in ["h1", "title"] {
        if let Some(title) = first_text(document, css) {
            return title;
        }
    }
    for css in [
        "meta[property=\"og:title\"]",
        "meta[name=\"twitter:title\"]",
    ] {
        if let Some(title) = first_attr(document, css, "content") {
            return title;
        }
    }
    if let Some(title) = first_text(document, ".entry-title, .post-title, .article-title") {
        return title;
    }
    FALLBACK_TITLE.to_owned()
}

fn extract_body_text(document: &Html) -> String {
    for css in BODY_SELECTORS {
        let sel = selector(css);
        if let Some(container) = document.select(&sel).next() {
            let text = element_to_text(container);
            if !text.trim().is_empty() {
                return text;
            }
        }
    }

    let body_sel = selector("body");
    document
        .select(&body_sel)
        .next()
        .map(element_to_text)
        .unwrap_or_default()
}

fn extract_author(document: &Html) -> Option<String> {
    for css in &AUTHOR_SELECTORS[..3] {
        if let Some(author) = first_text(document, css) {
            return Some(clean_author(&author));
        }
    }
    for css in [
        "meta[property=\"article:author\"]",
        "meta[name=\"author\"]",
    ] {
        if let Some(author) = first_attr(document, css, "content") {
            return Some(clean_author(&author));
        }
    }
    for css in &AUTHOR_SELECTORS[3..] {
        if let Some(author) = first_text(document, css) {
            return Some(clean_author(&author));
        }
    }
    None
}

fn clean_author(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("By ").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix("by ").unwrap_or(trimmed);
    trimmed.trim().to_owned()
}

fn extract_published_at(document: &Html) -> Option<DateTime<Utc>> {
    for css in [
        "meta[property=\"article:published_time\"]",
        "meta[property=\"article:modified_time\"]",
    ] {
        if let Some(candidate) = first_attr(document, css, "content")
            && let Some(parsed) = parse_date(&candidate)
        {
            return Some(parsed);
        }
    }

    let time_sel = selector("time[datetime]");
    for element in document.select(&time_sel) {
        if let Some(datetime) = element.value().attr("datetime")
            && let Some(parsed) = parse_date(datetime)
        {
            return Some(parsed);
        }
    }

    for css in DATE_SELECTORS {
        if let Some(candidate) = first_text(document, css)
            && let Some(parsed) = parse_date(&candidate)
        {
            return Some(parsed);
        }
    }
    None
}

/// Try RFC 3339 first, then the date formats editors actually type.
/// Candidates that parse as nothing are skipped, never fatal.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%m/%d/%Y"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ExtractedImage> {
    let img_sel = selector("img[src]");
    let mut images = Vec::new();

    for element in document.select(&img_sel) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        // Unresolvable or non-http srcs are skipped, not fatal.
        let Ok(resolved) = base_url.join(src.trim()) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        images.push(ExtractedImage {
            url: resolved.to_string(),
            alt: non_empty_attr(&element, "alt"),
            caption: non_empty_attr(&element, "title"),
            width: element.value().attr("width").and_then(|v| v.parse().ok()),
            height: element.value().attr("height").and_then(|v| v.parse().ok()),
        });
    }

    images
}

fn non_empty_attr(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css);
    for element in document.select(&sel) {
        let text = collapse_whitespace(&element.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css);
    for element in document.select(&sel) {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

/// Convert a container element to plain text. Block-level children become
/// separate paragraphs; `<br>` becomes a line break; lists keep one line
/// per item with its marker so list structure survives normalization.
fn element_to_text(root: ElementRef) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_text(root, &mut paragraphs, &mut current);
    flush(&mut paragraphs, &mut current);

    paragraphs.join("\n\n")
}

fn collect_text(element: ElementRef, paragraphs: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_inline(current, text);
            continue;
        }

        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let tag = child_el.value().name();

        if is_stripped(&child_el) {
            continue;
        }

        match tag {
            "br" => current.push('\n'),
            "ul" | "ol" => {
                flush(paragraphs, current);
                let list = list_to_text(child_el, tag == "ol");
                if !list.is_empty() {
                    paragraphs.push(list);
                }
            }
            _ if is_block_tag(tag) => {
                flush(paragraphs, current);
                collect_text(child_el, paragraphs, current);
                flush(paragraphs, current);
            }
            _ => collect_text(child_el, paragraphs, current),
        }
    }
}

fn list_to_text(list: ElementRef, ordered: bool) -> String {
    let li_sel = selector("li");
    let mut lines = Vec::new();
    for (idx, item) in list.select(&li_sel).enumerate() {
        let text = collapse_whitespace(&item.text().collect::<String>());
        if text.is_empty() {
            continue;
        }
        if ordered {
            lines.push(format!("{}. {text}", idx + 1));
        } else {
            lines.push(format!("- {text}"));
        }
    }
    lines.join("\n")
}

fn is_stripped(element: &ElementRef) -> bool {
    let tag = element.value().name();
    if STRIP_TAGS.contains(&tag) {
        return true;
    }

    let value = element.value();
    let class_and_id = value
        .attr("class")
        .unwrap_or_default()
        .to_ascii_lowercase()
        + " "
        + &value.attr("id").unwrap_or_default().to_ascii_lowercase();
    STRIP_CLASS_HINTS
        .iter()
        .any(|hint| class_and_id.contains(hint))
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "section"
            | "article"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "li"
            | "pre"
            | "table"
            | "tr"
            | "figure"
            | "figcaption"
            | "hr"
    )
}

fn push_inline(current: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    let starts_ws = text.chars().next().is_some_and(char::is_whitespace);
    let ends_ws = text.chars().last().is_some_and(char::is_whitespace);
    let collapsed = collapse_whitespace(text);

    if starts_ws && !current.is_empty() && !current.ends_with(char::is_whitespace) {
        current.push(' ');
    }
    if collapsed.is_empty() {
        return;
    }
    current.push_str(&collapsed);
    if ends_ws {
        current.push(' ');
    }
}

fn flush(paragraphs: &mut Vec<String>, current: &mut String) {
    let text = std::mem::take(current);
    let text = text.trim();
    if !text.is_empty() {
        paragraphs.push(text.to_owned());
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
