//! Unified error types for acctpack.
//!
//! This module provides a single [`AcctpackError`] enum that covers every
//! failure a caller of the session service or the pipeline can observe.
//!
//! # Error Handling Philosophy
//!
//! - **Rejected uploads** ([`UnsupportedFormat`](AcctpackError::UnsupportedFormat),
//!   [`TooLarge`](AcctpackError::TooLarge)) happen before anything is parsed
//! - **Empty results** are a distinct outcome, not a system failure
//! - **Broken containers** ([`WorkbookLoad`](AcctpackError::WorkbookLoad)) fail the whole request
//! - Malformed text lines and broken spreadsheet rows are never errors here;
//!   they are skipped by the pipeline

use std::io;

use thiserror::Error;

use crate::session::SessionId;

/// A specialized [`Result`] type for acctpack operations.
///
/// # Example
///
/// ```rust
/// use acctpack::error::Result;
/// use acctpack::Record;
///
/// fn my_function() -> Result<Vec<Record>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, AcctpackError>;

/// The error type for all acctpack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AcctpackError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - The temporary upload area cannot be created
    /// - A temp file cannot be written or read back
    /// - The output directory is not writable
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The uploaded file is neither a text file nor a spreadsheet.
    #[error("Unsupported file '{file_name}'. Expected one of: {expected}")]
    UnsupportedFormat {
        /// The file name as supplied by the caller
        file_name: String,
        /// Human-readable list of accepted extensions
        expected: &'static str,
    },

    /// The upload exceeds the configured size limit.
    #[error("File too large: {size} bytes (maximum: {max} bytes)")]
    TooLarge {
        /// Size of the upload (declared or actual, whichever is larger)
        size: u64,
        /// Configured maximum
        max: u64,
    },

    /// The full parse produced zero records.
    #[error("No Gmail accounts found in the input")]
    EmptyResult,

    /// A source label arrived for a session with no pending upload.
    #[error("No pending upload for session {session}")]
    NoPendingSession {
        /// The session that sent the label
        session: SessionId,
    },

    /// The pipeline was driven out of order.
    #[error("Pipeline is {actual}, expected {expected}")]
    InvalidState {
        /// State the operation requires
        expected: &'static str,
        /// State the pipeline was in
        actual: &'static str,
    },

    /// The source label cannot be used as a tag.
    #[error("Invalid source label '{label}': {reason}")]
    InvalidLabel {
        /// The label as received
        label: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// The spreadsheet container itself could not be read.
    ///
    /// No partial output is produced when this happens.
    #[error("Failed to load {format} workbook: {source}")]
    WorkbookLoad {
        /// The container format ("XLSX", "CSV")
        format: &'static str,
        /// The underlying error
        #[source]
        source: WorkbookErrorKind,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Kinds of workbook load errors.
#[derive(Debug, Error)]
pub enum WorkbookErrorKind {
    /// XLSX container error
    #[cfg(feature = "xlsx")]
    #[error("{0}")]
    Xlsx(#[from] calamine::XlsxError),
    /// CSV reader error
    #[cfg(feature = "csv-input")]
    #[error("{0}")]
    Csv(#[from] csv::Error),
    /// Anything else (missing worksheet, disabled feature)
    #[error("{0}")]
    Other(String),
}

impl From<std::string::FromUtf8Error> for AcctpackError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        AcctpackError::Utf8 {
            context: "text upload".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl AcctpackError {
    /// Creates an unsupported format error for a file name.
    pub fn unsupported_format(file_name: impl Into<String>) -> Self {
        AcctpackError::UnsupportedFormat {
            file_name: file_name.into(),
            expected: ".txt, .xlsx, .csv",
        }
    }

    /// Creates a size limit error.
    pub fn too_large(size: u64, max: u64) -> Self {
        AcctpackError::TooLarge { size, max }
    }

    /// Creates an invalid label error.
    pub fn invalid_label(label: impl Into<String>, reason: &'static str) -> Self {
        AcctpackError::InvalidLabel {
            label: label.into(),
            reason,
        }
    }

    /// Creates a workbook load error from a message.
    pub fn workbook(format: &'static str, message: impl Into<String>) -> Self {
        AcctpackError::WorkbookLoad {
            format,
            source: WorkbookErrorKind::Other(message.into()),
        }
    }

    /// Creates a workbook load error for an XLSX container.
    #[cfg(feature = "xlsx")]
    pub fn xlsx(source: calamine::XlsxError) -> Self {
        AcctpackError::WorkbookLoad {
            format: "XLSX",
            source: WorkbookErrorKind::Xlsx(source),
        }
    }

    /// Creates a workbook load error for a CSV file.
    #[cfg(feature = "csv-input")]
    pub fn csv(source: csv::Error) -> Self {
        AcctpackError::WorkbookLoad {
            format: "CSV",
            source: WorkbookErrorKind::Csv(source),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, AcctpackError::Io(_))
    }

    /// Returns `true` if the upload was rejected before parsing.
    pub fn is_rejected_upload(&self) -> bool {
        matches!(
            self,
            AcctpackError::UnsupportedFormat { .. } | AcctpackError::TooLarge { .. }
        )
    }

    /// Returns `true` if extraction finished without any record.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, AcctpackError::EmptyResult)
    }

    /// Returns `true` if no upload was waiting for a label.
    pub fn is_no_pending_session(&self) -> bool {
        matches!(self, AcctpackError::NoPendingSession { .. })
    }

    /// Returns `true` if the workbook could not be loaded.
    pub fn is_workbook_load(&self) -> bool {
        matches!(self, AcctpackError::WorkbookLoad { .. })
    }

    /// Returns `true` if the label was rejected.
    pub fn is_invalid_label(&self) -> bool {
        matches!(self, AcctpackError::InvalidLabel { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
