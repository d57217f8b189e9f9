//! Structured error types for quoteform.
//!
//! Export failures follow the pipeline stages: the preview target can be
//! missing, rasterization can fail, PDF assembly can fail, or the finished
//! file can fail to land on disk. Numeric form input never errors; it
//! coerces to zero in [`crate::totals::parse_number`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A failed export attempt. Every variant is terminal for that attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The render target holds no preview to capture.
    #[error("preview element not found; nothing to export")]
    MissingPreviewTarget,

    /// Another export is still in flight.
    #[error("an export is already in progress")]
    Busy,

    /// The rasterizer failed or produced an unusable image.
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// Building or serializing the PDF failed.
    #[error("PDF assembly failed: {0}")]
    Assembly(String),

    /// The finished PDF could not be written to its destination.
    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        ExportError::Assembly(e.to_string())
    }
}

/// Image loading, sniffing, and encoding failures.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported image format (expected PNG, JPEG, or WebP)")]
    UnsupportedFormat,

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Rejected form input that cannot be coerced to a sensible value.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("unknown font family '{0}'")]
    UnknownFontFamily(String),

    #[error("unknown font size '{0}'")]
    UnknownFontSize(String),

    #[error("logo upload failed: {0}")]
    Logo(#[from] ImageError),
}

/// Configuration file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
