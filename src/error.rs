//! Error types for each concern of the crate.

use thiserror::Error;
use uuid::Uuid;

/// Failures talking to the analysis backend.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Network failure or an undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("{0}")]
    Rejected(String),
    /// The configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Rejected value
        url: String,
        /// Parser message
        reason: String,
    },
    /// The selected upload failed the pre-flight check.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

/// Failures in the report pipeline or while packaging an artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Mounting produced no page that can be captured.
    #[error("no report pages mounted")]
    NoPagesMounted,
    /// A theme variable has no static value in the print palette.
    #[error("unresolved theme colour '{token}'")]
    UnresolvedColor {
        /// Token name including the leading `--`
        token: String,
    },
    /// A colour function the rasterizer cannot evaluate survived resolution.
    #[error("unsupported colour function '{0}'")]
    UnsupportedColorFunction(String),
    /// A capture was requested for a page that is not mounted.
    #[error("page {index} is not mounted")]
    NotMounted {
        /// Requested page
        index: usize,
    },
    /// The raster surface could not be allocated.
    #[error("failed to allocate a {width}x{height} bitmap")]
    BitmapAllocation {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
    /// PDF assembly failed.
    #[error("PDF generation error: {0}")]
    Pdf(String),
    /// I/O failure while writing the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

/// Failures loading or persisting a store bucket.
#[derive(Debug, Error)]
pub enum StoreError {
    /// State could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// File-backed persistence failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The storage backend refused the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// An export with the same id is already registered.
    #[error("export {0} is already registered")]
    DuplicateId(Uuid),
    /// A stored export payload is not a valid data URL.
    #[error("invalid export payload: {0}")]
    InvalidPayload(String),
}

/// Invalid environment-driven configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Variable name
        var: String,
        /// Why the value was rejected
        reason: String,
    },
    /// No data directory could be determined for this platform.
    #[error("unable to determine a data directory")]
    NoDataDir,
}
