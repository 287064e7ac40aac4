//! Error types for the HLS playlist engine

use thiserror::Error;

/// Result type alias for playlist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Playlist error types
#[derive(Error, Debug)]
pub enum Error {
    // Format errors
    #[error("invalid HLS playlist, does not start with #EXTM3U")]
    MissingHeader,

    #[error("invalid HLS playlist: {0}")]
    InvalidPlayList(String),

    #[error("incompatible tags or URI in HLS playlist: cannot be both {current} and {requested} playlist")]
    TypeConflict { current: String, requested: String },

    #[error("invalid {field} in {line}")]
    FieldFormat { field: &'static str, line: String },

    // Model errors
    #[error("empty {0} URI")]
    EmptyUri(&'static str),

    #[error("no file name specified to store the HLS playlist")]
    NoFileName,

    #[error("cannot serialize playlist: {0}")]
    Serialization(String),

    // Source errors
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid MIME type \"{mime}\" for HLS playlist at {url}")]
    InvalidMimeType { mime: String, url: String },

    #[error("invalid file name extension for HLS playlist in {0}")]
    InvalidFileName(String),

    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    // Network errors
    #[cfg(feature = "http")]
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the caller may retry the same operation later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Download { .. } | Error::Io(_) => true,
            #[cfg(feature = "http")]
            Error::Http(_) => true,
            _ => false,
        }
    }

    /// Returns a stable error code for logs and reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingHeader => "MISSING_HEADER",
            Error::InvalidPlayList(_) => "INVALID_PLAYLIST",
            Error::TypeConflict { .. } => "TYPE_CONFLICT",
            Error::FieldFormat { .. } => "FIELD_FORMAT",
            Error::EmptyUri(_) => "EMPTY_URI",
            Error::NoFileName => "NO_FILE_NAME",
            Error::Serialization(_) => "SERIALIZATION",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            Error::InvalidFileName(_) => "INVALID_FILE_NAME",
            Error::Download { .. } => "DOWNLOAD",
            #[cfg(feature = "http")]
            Error::Http(_) => "NETWORK",
            Error::Io(_) => "IO",
        }
    }
}
