//! Session service: the surface a chat transport (or the CLI) drives.
//!
//! Each caller session holds at most one pending upload. The flow is
//!
//! 1. [`SessionService::submit_file`] or [`SessionService::submit_pasted`]
//!    accepts input and returns a [`FilePreview`] with the record count.
//! 2. [`SessionService::submit_source_label`] (or
//!    [`SessionService::submit_selection`] for button-style transports)
//!    composes the tag and returns the [`Delivery`].
//!
//! Uploaded bytes are kept in a [`NamedTempFile`] under
//! [`SessionConfig::temp_dir`] while the session is pending, and the preview
//! is read back from that file. The file is removed when the pending upload
//! is dropped, whichever way the request ends.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use acctpack::config::SessionConfig;
//! use acctpack::counter::DailyCounterStore;
//! use acctpack::session::{SessionId, SessionService};
//! use acctpack::tagger::SystemClock;
//!
//! let service = SessionService::new(
//!     SessionConfig::new(),
//!     Arc::new(DailyCounterStore::new()),
//!     Arc::new(SystemClock),
//! );
//!
//! let body = b"a@gmail.com pw\nb@gmail.com pw2";
//! let preview = service.submit_file(SessionId(1), "list.txt", body.len() as u64, body)?;
//! assert_eq!(preview.count, 2);
//!
//! let delivery = service.submit_source_label(SessionId(1), "RANA")?;
//! println!("{}", delivery.caption());
//! delivery.write_to("out")?;
//! # Ok::<(), acctpack::AcctpackError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::SessionConfig;
use crate::counter::DailyCounterStore;
use crate::error::{AcctpackError, Result};
use crate::format::InputFormat;
use crate::pipeline::ExtractionPipeline;
use crate::tagger::{Clock, SourceLabel, SourceTag, SourceTagger};

/// Caller session identifier (a chat id, a user id, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token handed out with a preview; identifies one pending upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SelectionToken(u64);

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// What the caller learns after submitting input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilePreview {
    /// Number of records the input will produce
    pub count: usize,
    /// Token to pass back with the source selection
    pub token: SelectionToken,
    /// Detected input format
    pub format: InputFormat,
}

/// A finished extraction, ready to be sent back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Newline-joined records, no trailing newline
    pub text: String,
    /// Number of records
    pub count: usize,
    /// Tag embedded in every record
    pub tag: SourceTag,
    /// Artifact name, `{tag}.txt`
    pub file_name: String,
}

impl Delivery {
    /// Confirmation text shown with the artifact.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acctpack::session::Delivery;
    /// use acctpack::tagger::SourceTag;
    ///
    /// let delivery = Delivery {
    ///     text: "a@gmail.com|pw|SOURCE_X_SOURCE".into(),
    ///     count: 1,
    ///     tag: SourceTag::Verbatim("X".into()),
    ///     file_name: "X.txt".into(),
    /// };
    /// assert_eq!(delivery.caption(), "✅ Processed 1 Gmail accounts\nSource: X");
    /// ```
    pub fn caption(&self) -> String {
        format!(
            "✅ Processed {} Gmail accounts\nSource: {}",
            self.count, self.tag
        )
    }

    /// MIME type of the artifact, for transports that attach it.
    pub fn mime_type(&self) -> &'static str {
        InputFormat::Text.mime_type()
    }

    /// Writes the records into a temporary file in `dir`.
    ///
    /// The file is deleted when the returned handle is dropped, so the
    /// transport can upload it and forget about cleanup.
    pub fn into_artifact(self, dir: impl AsRef<Path>) -> Result<NamedTempFile> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", self.tag))
            .suffix(".txt")
            .tempfile_in(dir)?;
        file.write_all(self.text.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Writes `{tag}.txt` into `dir` and returns its path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.text)?;
        Ok(path)
    }
}

/// Result of a button-style source selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// First selection for the token
    Delivered(Delivery),
    /// Repeat of an already handled selection; nothing was done
    Duplicate,
}

struct PendingUpload {
    pipeline: ExtractionPipeline,
    token: SelectionToken,
    // Held only so the upload is removed from disk when this is dropped.
    upload: Option<NamedTempFile>,
}

impl PendingUpload {
    fn upload_path(&self) -> Option<&Path> {
        self.upload.as_ref().map(|file| file.path())
    }
}

#[derive(Default)]
struct Sessions {
    pending: HashMap<SessionId, PendingUpload>,
    completed: HashMap<SessionId, SelectionToken>,
}

/// Multi-session front end over the extraction pipeline.
pub struct SessionService {
    config: SessionConfig,
    tagger: SourceTagger,
    sessions: Mutex<Sessions>,
    next_token: AtomicU64,
}

impl SessionService {
    /// Creates a service sharing `counters` and `clock` with the tagger.
    pub fn new(
        config: SessionConfig,
        counters: Arc<DailyCounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tagger = SourceTagger::new(config.tagger.clone(), counters, clock);
        Self {
            config,
            tagger,
            sessions: Mutex::new(Sessions::default()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the tagger.
    pub fn tagger(&self) -> &SourceTagger {
        &self.tagger
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_token(&self) -> SelectionToken {
        SelectionToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn park(&self, session: SessionId, pending: PendingUpload) {
        if self.lock().pending.insert(session, pending).is_some() {
            log::debug!("session {session}: replaced pending upload");
        }
    }

    /// Accepts an uploaded file and counts its records.
    ///
    /// The extension is checked first, then the size
    /// (`max(declared_size, bytes.len())`), and only then are the bytes
    /// parsed. A new upload replaces any pending one for the session.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat`, `TooLarge`, `WorkbookLoad`, `Utf8` or `Io`.
    pub fn submit_file(
        &self,
        session: SessionId,
        file_name: &str,
        declared_size: u64,
        bytes: &[u8],
    ) -> Result<FilePreview> {
        let format = InputFormat::from_file_name(file_name)?;

        let size = declared_size.max(bytes.len() as u64);
        if size > self.config.max_upload_bytes {
            return Err(AcctpackError::too_large(size, self.config.max_upload_bytes));
        }

        fs::create_dir_all(&self.config.temp_dir)?;
        let mut upload = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&self.config.temp_dir)?;
        upload.write_all(bytes)?;
        upload.flush()?;

        // Parse the stored copy, the same file a transport download lands in
        let stored = fs::read(upload.path())?;
        let mut pipeline = ExtractionPipeline::new(self.config.extract.clone());
        let count = pipeline.accept_bytes(format, &stored)?;
        let token = self.issue_token();
        log::info!("session {session}: accepted {file_name} ({size} bytes, {count} records)");

        self.park(
            session,
            PendingUpload {
                pipeline,
                token,
                upload: Some(upload),
            },
        );
        Ok(FilePreview {
            count,
            token,
            format,
        })
    }

    /// Accepts a pasted list instead of a file.
    ///
    /// Returns `None` when the text is not a list of at least two
    /// `email password` lines; the session is left as it was.
    pub fn submit_pasted(&self, session: SessionId, text: &str) -> Option<FilePreview> {
        let mut pipeline = ExtractionPipeline::new(self.config.extract.clone());
        let count = pipeline.accept_pasted(text)?;
        let token = self.issue_token();
        log::info!("session {session}: accepted pasted list ({count} records)");

        self.park(
            session,
            PendingUpload {
                pipeline,
                token,
                upload: None,
            },
        );
        Some(FilePreview {
            count,
            token,
            format: InputFormat::Text,
        })
    }

    /// Finishes the pending upload of `session` with a source label.
    ///
    /// An invalid label leaves the upload pending so the caller can retry.
    ///
    /// # Errors
    ///
    /// `NoPendingSession`, `InvalidLabel` or `EmptyResult`.
    pub fn submit_source_label(&self, session: SessionId, label: &str) -> Result<Delivery> {
        if !self.lock().pending.contains_key(&session) {
            return Err(AcctpackError::NoPendingSession { session });
        }
        let label = self.tagger.parse_label(label)?;

        let pending = {
            let mut sessions = self.lock();
            let pending = sessions
                .pending
                .remove(&session)
                .ok_or(AcctpackError::NoPendingSession { session })?;
            sessions.completed.insert(session, pending.token);
            pending
        };
        self.finish(session, pending, &label)
    }

    /// Finishes a pending upload from a selection that carries its token.
    ///
    /// A repeated selection with an already handled token returns
    /// [`SelectionOutcome::Duplicate`] and does not touch the daily counter.
    ///
    /// # Errors
    ///
    /// `NoPendingSession`, `InvalidState` for a token that does not match
    /// the pending upload, `InvalidLabel` or `EmptyResult`.
    pub fn submit_selection(
        &self,
        session: SessionId,
        token: SelectionToken,
        label: &str,
    ) -> Result<SelectionOutcome> {
        let label = self.tagger.parse_label(label)?;

        let pending = {
            let mut sessions = self.lock();
            if sessions.completed.get(&session) == Some(&token) {
                log::debug!("session {session}: duplicate selection {token}");
                return Ok(SelectionOutcome::Duplicate);
            }
            match sessions.pending.get(&session) {
                None => return Err(AcctpackError::NoPendingSession { session }),
                Some(pending) if pending.token != token => {
                    return Err(AcctpackError::InvalidState {
                        expected: "current selection token",
                        actual: "stale selection token",
                    });
                }
                Some(_) => {}
            }
            let pending = sessions
                .pending
                .remove(&session)
                .ok_or(AcctpackError::NoPendingSession { session })?;
            sessions.completed.insert(session, token);
            pending
        };

        self.finish(session, pending, &label)
            .map(SelectionOutcome::Delivered)
    }

    fn finish(
        &self,
        session: SessionId,
        mut pending: PendingUpload,
        label: &SourceLabel,
    ) -> Result<Delivery> {
        let result = pending
            .pipeline
            .finalize_with(|count| self.tagger.compose(label, count));
        drop(pending);

        match result {
            Ok((tag, extraction)) => {
                let count = extraction.count();
                log::info!("session {session}: delivered {count} records as {tag}");
                Ok(Delivery {
                    text: extraction.text(),
                    count,
                    file_name: format!("{tag}.txt"),
                    tag,
                })
            }
            Err(e) => {
                log::info!("session {session}: {e}");
                Err(e)
            }
        }
    }

    /// Drops the pending upload of `session`, if any.
    pub fn discard(&self, session: SessionId) -> bool {
        let removed = self.lock().pending.remove(&session).is_some();
        if removed {
            log::debug!("session {session}: pending upload discarded");
        }
        removed
    }

    /// Number of sessions holding a pending upload.
    pub fn pending_sessions(&self) -> usize {
        self.lock().pending.len()
    }

    /// Preview count of the pending upload of `session`.
    pub fn pending_count(&self, session: SessionId) -> Option<usize> {
        self.lock()
            .pending
            .get(&session)
            .and_then(|p| p.pipeline.preview_count())
    }

    /// Path of the stored upload of `session`, while it is pending.
    pub fn pending_upload_path(&self, session: SessionId) -> Option<PathBuf> {
        self.lock()
            .pending
            .get(&session)
            .and_then(|p| p.upload_path().map(Path::to_path_buf))
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("config", &self.config)
            .field("tagger", &self.tagger)
            .field("pending", &self.pending_sessions())
            .finish_non_exhaustive()
    }
}
