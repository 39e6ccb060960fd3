use thiserror::Error;

/// Top-level error taxonomy for an import request.
///
/// Input errors are surfaced immediately and never retried by the pipeline;
/// transient I/O errors (`FetchFailed`, `Timeout`) are surfaced as a
/// distinct category the caller may retry; AI failures never appear here at
/// all because the enhancement stage recovers them locally (see
/// `enhance::AiError`). `Internal` marks invariant violations and is a bug,
/// not an input problem.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("fetch failed with status {status} {status_text}")]
    FetchFailed { status: u16, status_text: String },

    #[error("remote did not respond within the timeout")]
    Timeout,

    #[error("content is empty")]
    EmptyContent,

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file is too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("unsafe filename: {0}")]
    UnsafeFilename(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("rate limit exceeded for {action}: {limit} per hour")]
    RateLimited { action: &'static str, limit: u32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ImportError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::InvalidSource(_) => "invalid_source",
            ImportError::FetchFailed { .. } => "fetch_failed",
            ImportError::Timeout => "timeout",
            ImportError::EmptyContent => "empty_content",
            ImportError::UnsupportedType(_) => "unsupported_type",
            ImportError::TooLarge { .. } => "too_large",
            ImportError::UnsafeFilename(_) => "unsafe_filename",
            ImportError::ExtractionFailed(_) => "extraction_failed",
            ImportError::RateLimited { .. } => "rate_limited",
            ImportError::Validation(err) => err.code(),
            ImportError::Internal(_) => "internal",
        }
    }

    /// Whether the caller may reasonably retry the same request unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ImportError::FetchFailed { .. } | ImportError::Timeout
        )
    }
}

/// Failures from the pure validation layer. Each variant carries enough
/// detail for the caller to correct the input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("url must use http or https")]
    UrlScheme,

    #[error("url must not target a local or loopback host")]
    UrlLocalHost,

    #[error("text length {length} outside allowed range [{min}, {max}]")]
    TextLength {
        length: usize,
        min: usize,
        max: usize,
    },

    #[error("text must contain at least {min} words (found {found})")]
    TooFewWords { found: usize, min: usize },

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} exceeds {max} characters (found {found})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        found: usize,
    },

    #[error("publish date is more than one year in the future")]
    DateTooFarAhead,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UrlScheme => "url_scheme",
            ValidationError::UrlLocalHost => "url_local_host",
            ValidationError::TextLength { .. } => "text_length",
            ValidationError::TooFewWords { .. } => "too_few_words",
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::FieldTooLong { .. } => "field_too_long",
            ValidationError::DateTooFarAhead => "date_too_far_ahead",
        }
    }
}
