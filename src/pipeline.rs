//! Extraction pipeline.
//!
//! A request moves through
//! `AwaitingInput → AwaitingSourceLabel → Processing → Done | Failed`.
//!
//! The tag written into every record contains the record count, so each
//! request is extracted twice with the same pure builder:
//!
//! 1. [`Pass::Preview`] runs as soon as the input is accepted, with an empty
//!    tag, and only its count is kept.
//! 2. [`Pass::Final`] runs once the label is known, with the finished tag.
//!
//! # Example
//!
//! ```rust
//! use acctpack::config::ExtractConfig;
//! use acctpack::pipeline::{ExtractionPipeline, PipelineState};
//! use acctpack::source::TextSource;
//!
//! let mut pipeline = ExtractionPipeline::new(ExtractConfig::new());
//! let preview = pipeline.accept(Box::new(TextSource::new("a@gmail.com pw\nnoise")))?;
//! assert_eq!(preview, 1);
//!
//! let (tag, extraction) = pipeline.finalize_with(|count| format!("T{count}"))?;
//! assert_eq!(tag, "T1");
//! assert_eq!(extraction.text(), "a@gmail.com|pw|SOURCE_T1_SOURCE");
//! assert_eq!(pipeline.state(), &PipelineState::Done { count: 1 });
//! # Ok::<(), acctpack::AcctpackError>(())
//! ```

use std::fmt;

use crate::classifier::classify_row;
use crate::config::ExtractConfig;
use crate::error::{AcctpackError, Result};
use crate::format::InputFormat;
use crate::record::{Record, join_records};
use crate::source::{RawRow, RowSource, TextSource, load_source};
use crate::tokenizer::{candidate_tokens, is_pasted_list};

/// Which of the two extraction passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass<'a> {
    /// Counting pass with an empty tag
    Preview,
    /// Emitting pass with the finished tag
    Final {
        /// Tag embedded in every record
        tag: &'a str,
    },
}

impl Pass<'_> {
    fn tag(&self) -> &str {
        match self {
            Pass::Preview => "",
            Pass::Final { tag } => *tag,
        }
    }
}

/// Counters collected during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Rows or lines looked at, blanks included
    pub rows_seen: usize,
    /// Records produced
    pub records: usize,
    /// Blank text lines
    pub blank_lines: usize,
    /// Rows that were not candidates (no gmail first token, no email cell, header)
    pub skipped: usize,
    /// Spreadsheet rows that failed classification
    pub row_errors: usize,
}

/// Result of one pass: the ordered records and the pass counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Records in input order
    pub records: Vec<Record>,
    /// Counters
    pub stats: ExtractionStats,
}

impl Extraction {
    /// Number of records.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record was produced.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records joined by newline, without a trailing newline.
    pub fn text(&self) -> String {
        join_records(&self.records)
    }
}

/// Runs one pass over a row source.
///
/// Rows that do not produce a record are skipped. Broken spreadsheet rows
/// are logged (once, during the preview pass) and skipped; they never abort
/// the pass.
pub fn extract(source: &dyn RowSource, pass: Pass<'_>, config: &ExtractConfig) -> Extraction {
    let tag = pass.tag();
    let mut out = Extraction::default();

    for row in source.rows() {
        out.stats.rows_seen += 1;
        let record = match row {
            RawRow::Line { text, .. } if text.trim().is_empty() => {
                out.stats.blank_lines += 1;
                continue;
            }
            RawRow::Line { text, .. } => candidate_tokens(text, &config.gmail_marker)
                .and_then(|tokens| Record::from_tokens(&tokens, tag, &config.fallback_password)),
            RawRow::Cells { index: 0, .. } if config.skip_header => None,
            RawRow::Cells { index, cells } => match classify_row(cells, config.max_columns) {
                Ok(fields) => Record::from_classified(&fields, tag, &config.fallback_password),
                Err(e) => {
                    if pass == Pass::Preview {
                        log::warn!("skipping row {}: {}", index + 1, e);
                    }
                    out.stats.row_errors += 1;
                    continue;
                }
            },
        };

        match record {
            Some(record) => out.records.push(record),
            None => out.stats.skipped += 1,
        }
    }

    out.stats.records = out.records.len();
    log::debug!(
        "{} pass over {}: {} records from {} rows",
        match pass {
            Pass::Preview => "preview",
            Pass::Final { .. } => "final",
        },
        source.format(),
        out.stats.records,
        out.stats.rows_seen
    );
    out
}

/// Lifecycle of one extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for an upload or a pasted list
    AwaitingInput,
    /// Input accepted and counted; waiting for the source label
    AwaitingSourceLabel {
        /// Record count from the preview pass
        preview_count: usize,
    },
    /// Final pass running
    Processing,
    /// Final pass produced records
    Done {
        /// Number of records delivered
        count: usize,
    },
    /// Extraction finished without any record
    Failed,
}

impl PipelineState {
    /// Short state name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::AwaitingInput => "awaiting input",
            PipelineState::AwaitingSourceLabel { .. } => "awaiting source label",
            PipelineState::Processing => "processing",
            PipelineState::Done { .. } => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One extraction request driven through its states.
pub struct ExtractionPipeline {
    config: ExtractConfig,
    source: Option<Box<dyn RowSource>>,
    state: PipelineState,
}

impl ExtractionPipeline {
    /// Creates a pipeline waiting for input.
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            source: None,
            state: PipelineState::AwaitingInput,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Returns the extraction settings.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Returns the preview count while waiting for a label.
    pub fn preview_count(&self) -> Option<usize> {
        match self.state {
            PipelineState::AwaitingSourceLabel { preview_count } => Some(preview_count),
            _ => None,
        }
    }

    /// Returns the format of the accepted input.
    pub fn input_format(&self) -> Option<InputFormat> {
        self.source.as_ref().map(|s| s.format())
    }

    fn expect_state(&self, expected: &'static str, ok: bool) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(AcctpackError::InvalidState {
                expected,
                actual: self.state.name(),
            })
        }
    }

    /// Accepts a loaded source and runs the preview pass.
    ///
    /// Returns the preview record count. Zero is a valid preview; the request
    /// fails with [`AcctpackError::EmptyResult`] only when it is finalized.
    pub fn accept(&mut self, source: Box<dyn RowSource>) -> Result<usize> {
        self.expect_state(
            "awaiting input",
            self.state == PipelineState::AwaitingInput,
        )?;

        let preview = extract(source.as_ref(), Pass::Preview, &self.config);
        let preview_count = preview.count();
        self.source = Some(source);
        self.state = PipelineState::AwaitingSourceLabel { preview_count };
        Ok(preview_count)
    }

    /// Loads raw upload bytes and accepts them.
    pub fn accept_bytes(&mut self, format: InputFormat, bytes: &[u8]) -> Result<usize> {
        self.expect_state(
            "awaiting input",
            self.state == PipelineState::AwaitingInput,
        )?;
        let source = load_source(format, bytes, &self.config)?;
        self.accept(source)
    }

    /// Accepts a pasted block as text input, if it qualifies as a list.
    ///
    /// Returns `None` (and leaves the pipeline untouched) for text that is not
    /// a list of at least two `email password` lines.
    pub fn accept_pasted(&mut self, text: &str) -> Option<usize> {
        if self.state != PipelineState::AwaitingInput
            || !is_pasted_list(text, &self.config.gmail_marker)
        {
            return None;
        }
        self.accept(Box::new(TextSource::new(text))).ok()
    }

    /// Runs the final pass with a tag built from the preview count.
    ///
    /// `tag_for` is called exactly once, and only when the preview found at
    /// least one record. With an empty preview the pipeline moves to
    /// [`PipelineState::Failed`] without calling it.
    pub fn finalize_with<T, F>(&mut self, tag_for: F) -> Result<(T, Extraction)>
    where
        T: fmt::Display,
        F: FnOnce(usize) -> T,
    {
        let preview_count = match self.state {
            PipelineState::AwaitingSourceLabel { preview_count } => preview_count,
            _ => {
                return Err(AcctpackError::InvalidState {
                    expected: "awaiting source label",
                    actual: self.state.name(),
                });
            }
        };
        let Some(source) = self.source.as_deref() else {
            return Err(AcctpackError::InvalidState {
                expected: "awaiting source label",
                actual: self.state.name(),
            });
        };

        if preview_count == 0 {
            self.state = PipelineState::Failed;
            return Err(AcctpackError::EmptyResult);
        }

        self.state = PipelineState::Processing;
        let tag = tag_for(preview_count);
        let tag_text = tag.to_string();
        let extraction = extract(source, Pass::Final { tag: &tag_text }, &self.config);

        if extraction.is_empty() {
            self.state = PipelineState::Failed;
            return Err(AcctpackError::EmptyResult);
        }
        if extraction.count() != preview_count {
            log::warn!(
                "final pass produced {} records, preview counted {}",
                extraction.count(),
                preview_count
            );
        }

        self.state = PipelineState::Done {
            count: extraction.count(),
        };
        Ok((tag, extraction))
    }

    /// Runs the final pass with a fixed tag.
    pub fn finalize(&mut self, tag: &str) -> Result<Extraction> {
        self.finalize_with(|_| tag.to_string())
            .map(|(_, extraction)| extraction)
    }
}

impl fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("config", &self.config)
            .field("format", &self.input_format())
            .field("state", &self.state)
            .finish()
    }
}
