use std::path::PathBuf;

use ::scraper::error::SelectorErrorKind;

/// All errors that can surface from the KBO game-time pipeline.
#[derive(thiserror::Error, Debug)]
pub enum KboError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// Failed to construct the shared HTTP client.
    #[error("failed to construct http client: {0}")]
    HttpClient(reqwest::Error),

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// A browser-automation command failed (session start, navigation, wait, click).
    #[error("browser automation failed: {0}")]
    Browser(String),

    /// Filesystem error while persisting or clearing a cache document.
    #[error("cache io error at {path}: {source}")]
    CacheIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A cache document could not be serialized for writing.
    #[error("cache encode error at {path}: {source}")]
    CacheEncode {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to parse a date from configuration or caller input.
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// A configuration value was present but malformed.
    #[error("invalid configuration for {key}: {value}")]
    Config { key: &'static str, value: String },

    /// Both fetch paths failed for a page the caller asked for directly.
    #[error("could not load {context}: {reason}")]
    Unavailable {
        context: &'static str,
        reason: String,
    },
}

impl<'a> From<SelectorErrorKind<'a>> for KboError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        KboError::Selector(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KboError>;
