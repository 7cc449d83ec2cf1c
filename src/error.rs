//! Error types for Lunchbox
//!
//! All modules use `LunchboxResult<T>` as their return type. Image fetches
//! classify failures with the cloneable [`FetchError`] so a single result can
//! be handed to every caller waiting on the same identifier.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Lunchbox operations
pub type LunchboxResult<T> = Result<T, LunchboxError>;

/// Outcome of one image fetch: the image or the reason there is none
pub type FetchResult<T> = Result<T, FetchError>;

/// Why an image fetch produced no image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid resource identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Image decode failed: {0}")]
    DecodeFailure(String),

    #[error("File system failure: {0}")]
    FileSystemFailure(String),
}

impl FetchError {
    /// Create an invalid identifier error
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a file system error carrying the path and the io error text
    pub fn fs(path: &std::path::Path, source: &std::io::Error) -> Self {
        Self::FileSystemFailure(format!("{}: {}", path.display(), source))
    }
}

/// All errors that can occur in Lunchbox
#[derive(Error, Debug)]
pub enum LunchboxError {
    // Fetch errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // Web content errors
    #[error("Cannot open page: {0}")]
    PageUnavailable(String),

    #[error("Page load failed: {0}")]
    PageLoad(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl LunchboxError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Fetch(FetchError::InvalidIdentifier { .. }) => {
                Some("Pass an http(s) URL, a file:// URL or an existing file path")
            }
            Self::Fetch(FetchError::InvalidResponse(_)) => {
                Some("The server must answer 2xx with an image/* content type")
            }
            Self::PageUnavailable(_) => Some("Check the address; only http, https and file pages open"),
            _ => None,
        }
    }
}
