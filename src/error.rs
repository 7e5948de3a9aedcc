use thiserror::Error;

/// Convenience result type for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Error type returned by workbook decoding, sheet extraction and the HTTP layer.
///
/// A single enum is shared across the whole request lifecycle; the HTTP layer maps each variant to
/// a status code.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The multipart upload was missing or could not be read.
    #[error("upload error: {message}")]
    Upload { message: String },

    /// The uploaded bytes are not a workbook the decoder understands.
    #[error("workbook decode error: {0}")]
    Decode(#[from] calamine::Error),

    /// The named sheet does not exist or its cells could not be loaded.
    #[error("cannot open sheet '{sheet}': {message}")]
    SheetOpen { sheet: String, message: String },

    /// A row cursor failed part-way through a sheet.
    #[error("failed to read row {row} of sheet '{sheet}': {message}")]
    RowRead {
        sheet: String,
        row: usize,
        message: String,
    },

    /// Extraction stopped because the shared cancellation token fired.
    #[error("extraction of sheet '{sheet}' was cancelled")]
    Cancelled { sheet: String },

    /// The output map could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Engine options were rejected before any work started.
    #[error("invalid extraction options: {message}")]
    InvalidOptions { message: String },

    /// The extraction thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A blocking worker task panicked or was aborted.
    #[error("worker task failed: {message}")]
    Worker { message: String },
}

impl ExtractionError {
    /// True for [`ExtractionError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
