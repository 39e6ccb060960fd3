//! Source admission: URL fetching plus raw text / file intake.
//!
//! Everything here runs before extraction. The URL path enforces scheme and
//! host restrictions, a bounded timeout, and an HTML content-type check;
//! the file path enforces MIME, size, and filename safety.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use url::Url;

use crate::error::{ImportError, ValidationError};
use crate::validate;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Allow loopback/private hosts. Off in production; tests flip this to
    /// fetch from a local stub server.
    pub allow_local_hosts: bool,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            allow_local_hosts: false,
            user_agent: "forge-import/0.1".to_owned(),
        }
    }
}

#[derive(Debug)]
pub struct FetchedPage {
    pub markup: String,
    /// Final URL after redirects; image srcs are resolved against this.
    pub base_url: Url,
}

pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<FetchedPage, ImportError> {
    let url = Url::parse(url).map_err(|err| ImportError::InvalidSource(err.to_string()))?;

    match validate::validate_url(&url) {
        Ok(()) => {}
        Err(ValidationError::UrlLocalHost) if config.allow_local_hosts => {}
        Err(err) => return Err(ImportError::Validation(err)),
    }

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|err| ImportError::Internal(format!("build http client: {err}")))?;

    let response = client
        .get(url.clone())
        .header(USER_AGENT, &config.user_agent)
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                ImportError::Timeout
            } else {
                ImportError::FetchFailed {
                    status: 0,
                    status_text: err.to_string(),
                }
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImportError::FetchFailed {
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_owned(),
        });
    }

    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        // Only markup comes through this path; plain text goes through
        // `accept_text` instead.
        let content_type = content_type.to_ascii_lowercase();
        if !(content_type.starts_with("text/html")
            || content_type.starts_with("application/xhtml+xml"))
        {
            return Err(ImportError::UnsupportedType(content_type));
        }
    }

    let base_url = response.url().clone();
    let markup = response.text().await.map_err(|err| {
        if err.is_timeout() {
            ImportError::Timeout
        } else {
            ImportError::FetchFailed {
                status: 0,
                status_text: format!("read body: {err}"),
            }
        }
    })?;

    if markup.trim().is_empty() {
        return Err(ImportError::EmptyContent);
    }

    tracing::debug!(url = %base_url, bytes = markup.len(), "fetched page");
    Ok(FetchedPage { markup, base_url })
}

/// Admit pasted text. Trims and refuses empty input; length/word bounds are
/// the validation layer's job and run later in the pipeline.
pub fn accept_text(text: &str) -> Result<String, ImportError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ImportError::EmptyContent);
    }
    Ok(trimmed.to_owned())
}

/// Admit an uploaded file: MIME must be in the supported set, size under
/// the ceiling, filename free of traversal and executable patterns.
pub fn accept_file<'a>(
    filename: &str,
    mime_type: &str,
    bytes: &'a [u8],
) -> Result<&'a [u8], ImportError> {
    if !validate::is_safe_filename(filename) {
        return Err(ImportError::UnsafeFilename(filename.to_owned()));
    }
    if !validate::is_supported_mime_type(mime_type) {
        return Err(ImportError::UnsupportedType(mime_type.to_owned()));
    }
    if bytes.len() > validate::FILE_MAX_BYTES {
        return Err(ImportError::TooLarge {
            size: bytes.len(),
            limit: validate::FILE_MAX_BYTES,
        });
    }
    if bytes.is_empty() {
        return Err(ImportError::EmptyContent);
    }
    Ok(bytes)
}
