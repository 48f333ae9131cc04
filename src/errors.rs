use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by a [`ContractStore`](crate::ContractStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error from the database driver
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The backing store could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while laying out or serializing a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A table or sheet was requested without any columns
    #[error("column schema must contain at least one column")]
    EmptySchema,

    /// A table column does not fit inside the printable area
    #[error("column `{label}` ({x}..{right}) lies outside the printable width {printable}")]
    ColumnOutOfBounds {
        /// Header label of the offending column
        label: String,
        /// Left edge of the column
        x: f32,
        /// Right edge of the column
        right: f32,
        /// Right edge of the printable area
        printable: f32,
    },

    /// A branding asset could not be read
    #[error("failed to read asset {}", path.display())]
    Asset {
        /// Path of the asset
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The logo is not a baseline or progressive JPEG
    #[error("unsupported image {}: {reason}", path.display())]
    UnsupportedImage {
        /// Path of the image
        path: PathBuf,
        /// Why the image was rejected
        reason: &'static str,
    },

    /// Error from the PDF writer
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    /// Error while writing the document bytes
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error from the spreadsheet writer
    #[error(transparent)]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// A row could not be converted into cells
    #[error("failed to serialize row: {0}")]
    Row(#[from] serde_json::Error),
}

/// Errors returned by the report pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The request itself is inconsistent
    #[error("invalid report request: {0}")]
    InvalidRequest(&'static str),

    /// Fetching the report rows failed
    #[error("failed to fetch report rows")]
    Store(#[from] StoreError),

    /// Rendering the document failed
    #[error("failed to render report")]
    Render(#[from] RenderError),
}

impl ReportError {
    /// Message safe to show to the end user.
    ///
    /// Details stay in the server logs.
    pub fn user_message(&self) -> &'static str {
        "Failed to generate report"
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Name of the variable
        name: &'static str,
        /// Raw value that was rejected
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration is well-formed but not usable
    #[error("invalid configuration: {0}")]
    Inconsistent(&'static str),
}

/// Error returned when parsing a [`ProposalToken`](crate::ProposalToken).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed proposal token")]
pub struct TokenError;
