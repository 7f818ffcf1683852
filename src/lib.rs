//! # acctpack
//!
//! A Rust library for turning loosely formatted account lists into
//! normalized, source-tagged records.
//!
//! ## Overview
//!
//! acctpack reads lists from:
//! - **Text** (`.txt`) - one `email password [recovery]` entry per line
//! - **XLSX** (`.xlsx`) - first worksheet, first 5 columns
//! - **CSV** (`.csv`) - first 5 columns
//!
//! and writes one line per Gmail account:
//!
//! ```text
//! email|password|recovery|SOURCE_RANA_1510_3_120-gmails_143005_SOURCE
//! ```
//!
//! The tag carries the source code, the local date, a per-day sequence number
//! for that code, the record count and the local time.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use acctpack::prelude::*;
//!
//! let service = SessionService::new(
//!     SessionConfig::new().with_temp_dir(std::env::temp_dir().join("acctpack-doc")),
//!     Arc::new(DailyCounterStore::new()),
//!     Arc::new(SystemClock),
//! );
//!
//! let body = b"user1@gmail.com pass123\nnotgmail@yahoo.com x\n";
//! let preview = service.submit_file(SessionId(1), "list.txt", body.len() as u64, body)?;
//! assert_eq!(preview.count, 1);
//!
//! let delivery = service.submit_source_label(SessionId(1), "RANA")?;
//! assert!(delivery.text.starts_with("user1@gmail.com|pass123|SOURCE_RANA_"));
//! # Ok::<(), acctpack::AcctpackError>(())
//! ```
//!
//! ## Module Structure
//!
//! - [`session`] - [`SessionService`](session::SessionService), the entry point for transports
//! - [`pipeline`] - [`ExtractionPipeline`](pipeline::ExtractionPipeline), preview and final passes
//! - [`source`] - [`RowSource`](source::RowSource) and the text/sheet loaders
//! - [`tokenizer`], [`classifier`], [`record`] - line and row parsing, [`Record`]
//! - [`tagger`], [`counter`] - tag composition and the shared daily counters
//! - [`config`], [`format`] - configuration types and input format detection
//! - [`error`] - [`AcctpackError`], [`Result`]
//! - [`prelude`] - Convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod classifier;
pub mod config;
pub mod counter;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod source;
pub mod tagger;
pub mod tokenizer;

// Re-export the main types at the crate root for convenience
pub use error::{AcctpackError, Result};
pub use record::Record;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use acctpack::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Record;

    // Error types
    pub use crate::error::{AcctpackError, Result};

    // Configuration
    pub use crate::config::{ExtractConfig, LabelMode, SessionConfig, TagStyle, TaggerConfig};
    pub use crate::format::InputFormat;

    // Session service
    pub use crate::session::{Delivery, FilePreview, SelectionOutcome, SessionId, SessionService};

    // Pipeline and sources
    pub use crate::pipeline::{Extraction, ExtractionPipeline, Pass, PipelineState, extract};
    pub use crate::source::{RowSource, SheetSource, TextSource, load_source};

    // Tagging
    pub use crate::counter::DailyCounterStore;
    pub use crate::tagger::{Clock, FixedClock, SourceLabel, SourceTag, SourceTagger, SystemClock};
}
