//! Pure validation functions applied at pipeline boundaries.
//!
//! Each function is side-effect-free and returns the first failure it
//! finds; the pipeline calls them eagerly and short-circuits.

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::error::ValidationError;
use crate::model::{RawDocument, count_words};

/// Canonical server-side bounds for pasted text. The UI form uses its own
/// stricter pre-check; this bound is the authoritative one.
pub const TEXT_MIN_CHARS: usize = 50;
pub const TEXT_MAX_CHARS: usize = 100_000;
pub const TEXT_MIN_WORDS: usize = 10;

pub const FILE_MAX_BYTES: usize = 10 * 1024 * 1024;

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 100_000;
pub const EXCERPT_MAX_CHARS: usize = 500;
pub const AUTHOR_MAX_CHARS: usize = 100;

/// MIME types the file path accepts. Anything else is rejected before any
/// extraction is attempted.
pub const SUPPORTED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

const UNSAFE_EXTENSIONS: [&str; 8] = [
    ".exe", ".sh", ".bat", ".cmd", ".com", ".scr", ".js", ".php",
];

pub fn validate_url(url: &Url) -> Result<(), ValidationError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::UrlScheme);
    }
    if let Some(host) = url.host_str()
        && is_local_host(host)
    {
        return Err(ValidationError::UrlLocalHost);
    }
    Ok(())
}

/// Loopback, unspecified, and private-range hosts are refused so an import
/// request cannot be used to probe the internal network.
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") || host.to_ascii_lowercase().ends_with(".localhost")
    {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => {
            ip.is_loopback() || ip.is_unspecified() || ip.is_private() || ip.is_link_local()
        }
        Ok(IpAddr::V6(ip)) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => false,
    }
}

pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    let length = text.chars().count();
    if length < TEXT_MIN_CHARS || length > TEXT_MAX_CHARS {
        return Err(ValidationError::TextLength {
            length,
            min: TEXT_MIN_CHARS,
            max: TEXT_MAX_CHARS,
        });
    }
    let words = count_words(text);
    if words < TEXT_MIN_WORDS {
        return Err(ValidationError::TooFewWords {
            found: words,
            min: TEXT_MIN_WORDS,
        });
    }
    Ok(())
}

pub fn is_supported_mime_type(mime: &str) -> bool {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    SUPPORTED_MIME_TYPES.contains(&mime.as_str())
}

pub fn is_safe_filename(filename: &str) -> bool {
    if filename.is_empty() || filename.contains("..") {
        return false;
    }
    if filename.contains('/') || filename.contains('\\') || filename.contains('\0') {
        return false;
    }
    let lower = filename.to_ascii_lowercase();
    !UNSAFE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Pre-sink check on the finished document.
pub fn validate_document(doc: &RawDocument) -> Result<(), ValidationError> {
    require_in_range("title", &doc.title, TITLE_MAX_CHARS)?;
    require_in_range("body", &doc.body, BODY_MAX_CHARS)?;

    if let Some(excerpt) = &doc.excerpt {
        check_max("excerpt", excerpt, EXCERPT_MAX_CHARS)?;
    }
    if let Some(author) = &doc.author {
        check_max("author", author, AUTHOR_MAX_CHARS)?;
    }
    if let Some(published_at) = doc.published_at {
        validate_publish_date(published_at)?;
    }
    Ok(())
}

pub fn validate_publish_date(published_at: DateTime<Utc>) -> Result<(), ValidationError> {
    if published_at > Utc::now() + Duration::days(365) {
        return Err(ValidationError::DateTooFarAhead);
    }
    Ok(())
}

fn require_in_range(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    check_max(field, value, max)
}

fn check_max(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let found = value.chars().count();
    if found > max {
        return Err(ValidationError::FieldTooLong { field, max, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentMetadata;

    fn doc(title: &str, body: &str) -> RawDocument {
        RawDocument {
            title: title.to_owned(),
            body: body.to_owned(),
            excerpt: None,
            author: None,
            published_at: None,
            images: Vec::new(),
            categories: Vec::new(),
            metadata: DocumentMetadata::for_body(body, None),
        }
    }

    #[test]
    fn text_length_boundaries() {
        let short = "word ".repeat(10);
        let at_min: String = short.chars().take(TEXT_MIN_CHARS).collect();
        assert_eq!(at_min.chars().count(), 50);
        assert!(validate_text(&at_min).is_ok());

        let below: String = at_min.chars().take(49).collect();
        assert!(matches!(
            validate_text(&below),
            Err(ValidationError::TextLength { length: 49, .. })
        ));
    }

    #[test]
    fn text_needs_ten_words() {
        let ten_words = "alpha beta gamma delta epsilon zeta eta theta iota padding-padding";
        let six_words = "aaaaaaaaaa bbbbbbbbbb cccccccccc dddddddddd eeeeeeeeee ffffff";
        assert!(validate_text(ten_words).is_ok());
        assert!(matches!(
            validate_text(six_words),
            Err(ValidationError::TooFewWords { .. })
        ));
    }

    #[test]
    fn rejects_loopback_and_private_hosts() {
        for host in ["localhost", "127.0.0.1", "10.1.2.3", "192.168.0.4", "::1", "0.0.0.0"] {
            assert!(is_local_host(host), "{host} should be refused");
        }
        assert!(!is_local_host("example.com"));
        assert!(!is_local_host("203.0.113.9"));
    }

    #[test]
    fn rejects_non_http_schemes() {
        let ftp = Url::parse("ftp://example.com/file").unwrap();
        assert!(matches!(validate_url(&ftp), Err(ValidationError::UrlScheme)));

        let local = Url::parse("http://localhost/x").unwrap();
        assert!(matches!(
            validate_url(&local),
            Err(ValidationError::UrlLocalHost)
        ));

        let ok = Url::parse("https://example.com/post").unwrap();
        assert!(validate_url(&ok).is_ok());
    }

    #[test]
    fn filename_safety() {
        assert!(is_safe_filename("sermon-notes.pdf"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("notes/evil.pdf"));
        assert!(!is_safe_filename("payload.exe"));
        assert!(!is_safe_filename("script.sh"));
    }

    #[test]
    fn mime_type_check_ignores_parameters() {
        assert!(is_supported_mime_type("text/plain; charset=utf-8"));
        assert!(is_supported_mime_type("application/pdf"));
        assert!(!is_supported_mime_type("application/zip"));
    }

    #[test]
    fn document_bounds() {
        assert!(validate_document(&doc("Title", "Body text")).is_ok());
        assert!(matches!(
            validate_document(&doc("   ", "Body text")),
            Err(ValidationError::MissingField { field: "title" })
        ));

        let long_title = "t".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(
            validate_document(&doc(&long_title, "Body text")),
            Err(ValidationError::FieldTooLong { field: "title", .. })
        ));
    }

    #[test]
    fn publish_date_window() {
        assert!(validate_publish_date(Utc::now()).is_ok());
        assert!(validate_publish_date(Utc::now() + Duration::days(300)).is_ok());
        assert!(matches!(
            validate_publish_date(Utc::now() + Duration::days(400)),
            Err(ValidationError::DateTooFarAhead)
        ));
    }
}
