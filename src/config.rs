//! Configuration types for extraction, tagging and sessions.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`ExtractConfig`] - how rows become records
//! - [`TaggerConfig`] - how source labels become tags
//! - [`SessionConfig`] - upload limits and the temp area, plus the two above
//!
//! # Example
//!
//! ```rust
//! use acctpack::config::{ExtractConfig, SessionConfig, TaggerConfig, TagStyle};
//!
//! let config = SessionConfig::new()
//!     .with_max_upload_bytes(5 * 1024 * 1024)
//!     .with_extract(ExtractConfig::new().with_skip_header(true))
//!     .with_tagger(TaggerConfig::new().with_style(TagStyle::Compact));
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Password written when a row carries no non-email field.
pub const FALLBACK_PASSWORD: &str = "aass1122";

/// Only the first this-many spreadsheet columns are scanned.
pub const MAX_COLUMNS: usize = 5;

/// Offset of the local clock used for tag dates, in hours east of UTC.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Upload size limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Source codes offered to callers by default.
pub const DEFAULT_SOURCE_CODES: &[&str] = &["RANA", "SHA", "KAR", "BL", "CUSTOM"];

/// Configuration for turning rows into records.
///
/// # Example
///
/// ```rust
/// use acctpack::config::ExtractConfig;
///
/// let config = ExtractConfig::new()
///     .with_fallback_password("changeme")
///     .with_skip_header(true);
/// assert_eq!(config.max_columns, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Password used when no non-email field exists (default: `aass1122`)
    pub fallback_password: String,

    /// Number of leading spreadsheet columns scanned per row (default: 5)
    pub max_columns: usize,

    /// Skip the first spreadsheet row as a header (default: false)
    pub skip_header: bool,

    /// Substring the first token of a text line must contain, matched
    /// case-insensitively (default: `@gmail.com`)
    pub gmail_marker: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            fallback_password: FALLBACK_PASSWORD.to_string(),
            max_columns: MAX_COLUMNS,
            skip_header: false,
            gmail_marker: "@gmail.com".to_string(),
        }
    }
}

impl ExtractConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback password.
    #[must_use]
    pub fn with_fallback_password(mut self, password: impl Into<String>) -> Self {
        self.fallback_password = password.into();
        self
    }

    /// Sets the number of scanned columns.
    #[must_use]
    pub fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns;
        self
    }

    /// Sets whether the first spreadsheet row is a header.
    #[must_use]
    pub fn with_skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    /// Sets the marker a text line's first token must contain.
    #[must_use]
    pub fn with_gmail_marker(mut self, marker: impl Into<String>) -> Self {
        self.gmail_marker = marker.into().to_lowercase();
        self
    }
}

/// Layout of a composed source tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    /// `{CODE}_{DDMM}_{seq}_{count}-gmails_{HHMMSS}`
    #[default]
    Full,
    /// `{CODE}_{DDMM}_{seq}_{count}_{HHMM}`
    Compact,
}

/// How a caller-supplied label becomes the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// The label is a short code; date, sequence, count and time are added.
    #[default]
    Composed,
    /// The label is used as the tag unchanged.
    Verbatim,
}

/// Configuration for [`SourceTagger`](crate::tagger::SourceTagger).
///
/// # Example
///
/// ```rust
/// use acctpack::config::{LabelMode, TaggerConfig};
///
/// let config = TaggerConfig::new().with_label_mode(LabelMode::Verbatim);
/// assert_eq!(config.utc_offset_hours, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Fixed offset of the tagging clock, hours east of UTC (default: 7)
    pub utc_offset_hours: i32,

    /// Tag layout (default: [`TagStyle::Full`])
    pub style: TagStyle,

    /// Label interpretation (default: [`LabelMode::Composed`])
    pub label_mode: LabelMode,

    /// Codes accepted in composed mode; empty accepts any code
    pub allowed_codes: Vec<String>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            style: TagStyle::Full,
            label_mode: LabelMode::Composed,
            allowed_codes: DEFAULT_SOURCE_CODES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TaggerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clock offset in hours east of UTC.
    #[must_use]
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Sets the tag layout.
    #[must_use]
    pub fn with_style(mut self, style: TagStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets how labels are interpreted.
    #[must_use]
    pub fn with_label_mode(mut self, mode: LabelMode) -> Self {
        self.label_mode = mode;
        self
    }

    /// Replaces the accepted code list. Pass an empty iterator to accept any code.
    #[must_use]
    pub fn with_allowed_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_codes = codes.into_iter().map(|c| c.into().to_uppercase()).collect();
        self
    }
}

/// Configuration for [`SessionService`](crate::session::SessionService).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Largest accepted upload in bytes (default: 10 MiB)
    pub max_upload_bytes: u64,

    /// Directory for upload and output temp files (default: `$TMPDIR/acctpack`)
    pub temp_dir: PathBuf,

    /// Extraction settings
    pub extract: ExtractConfig,

    /// Tagging settings
    pub tagger: TaggerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temp_dir: std::env::temp_dir().join("acctpack"),
            extract: ExtractConfig::default(),
            tagger: TaggerConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the upload size limit.
    #[must_use]
    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Sets the temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Sets the extraction settings.
    #[must_use]
    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    /// Sets the tagging settings.
    #[must_use]
    pub fn with_tagger(mut self, tagger: TaggerConfig) -> Self {
        self.tagger = tagger;
        self
    }
}
