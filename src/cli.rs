//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`Style`] - Tag layout options
//!
//! [`Args::session_config`] maps the flags onto a [`SessionConfig`], so the
//! binary and any other front end build the service the same way:
//!
//! ```rust
//! use acctpack::cli::Args;
//! use acctpack::config::TagStyle;
//! use clap::Parser;
//!
//! let args = Args::parse_from(["acctpack", "list.txt", "-s", "RANA", "--compact"]);
//! let config = args.session_config();
//! assert_eq!(config.tagger.style, TagStyle::Compact);
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_UTC_OFFSET_HOURS, ExtractConfig, FALLBACK_PASSWORD, LabelMode, SessionConfig,
    TagStyle, TaggerConfig,
};

/// Normalize Gmail account lists (TXT, XLSX, CSV) into
/// `email|password|recovery|SOURCE_{tag}_SOURCE` lines.
#[derive(Parser, Debug, Clone)]
#[command(name = "acctpack")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    acctpack accounts.txt --source RANA
    acctpack sheet.xlsx -s kar -o out/ --skip-header
    acctpack list.csv -s SHA --style compact --json
    acctpack dump.txt -s batch-42 --verbatim")]
pub struct Args {
    /// Path to input file (.txt, .xlsx or .csv)
    pub input: String,

    /// Source code (RANA, SHA, KAR, BL, CUSTOM) or, with --verbatim, the full tag
    #[arg(short, long, value_name = "LABEL")]
    pub source: String,

    /// Directory the `{tag}.txt` file is written to
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Use the label as the tag instead of composing one
    #[arg(long)]
    pub verbatim: bool,

    /// Tag layout
    #[arg(long, value_enum, default_value = "full")]
    pub style: Style,

    /// Shorthand for --style compact
    #[arg(long, conflicts_with = "style")]
    pub compact: bool,

    /// Accept any source code, not only the built-in list
    #[arg(long)]
    pub any_code: bool,

    /// Skip the first spreadsheet row
    #[arg(long)]
    pub skip_header: bool,

    /// Hours east of UTC used for the tag date and time
    #[arg(long, value_name = "HOURS", default_value_t = DEFAULT_UTC_OFFSET_HOURS, allow_hyphen_values = true)]
    pub utc_offset: i32,

    /// Password used when a row has none
    #[arg(long, value_name = "PASSWORD", default_value = FALLBACK_PASSWORD)]
    pub fallback_password: String,

    /// Print a JSON summary instead of progress output
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Returns the effective tag layout.
    pub fn tag_style(&self) -> TagStyle {
        if self.compact {
            TagStyle::Compact
        } else {
            self.style.into()
        }
    }

    /// Builds the session configuration for these flags.
    pub fn session_config(&self) -> SessionConfig {
        let extract = ExtractConfig::new()
            .with_skip_header(self.skip_header)
            .with_fallback_password(self.fallback_password.clone());

        let mut tagger = TaggerConfig::new()
            .with_utc_offset_hours(self.utc_offset)
            .with_style(self.tag_style());
        if self.verbatim {
            tagger = tagger.with_label_mode(LabelMode::Verbatim);
        }
        if self.any_code {
            tagger = tagger.with_allowed_codes(Vec::<String>::new());
        }

        SessionConfig::new()
            .with_extract(extract)
            .with_tagger(tagger)
    }
}

/// Tag layout options.
///
/// - [`Full`](Style::Full) - `RANA_1510_3_120-gmails_143005`
/// - [`Compact`](Style::Compact) - `RANA_1510_3_120_1430`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Count with `-gmails` suffix, time with seconds
    #[default]
    Full,

    /// Bare count, time without seconds
    #[value(alias = "short")]
    Compact,
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Style::Full => write!(f, "full"),
            Style::Compact => write!(f, "compact"),
        }
    }
}

impl From<Style> for TagStyle {
    fn from(style: Style) -> TagStyle {
        match style {
            Style::Full => TagStyle::Full,
            Style::Compact => TagStyle::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["acctpack", "in.txt", "--source", "RANA"]);
        assert_eq!(args.output, ".");
        assert_eq!(args.utc_offset, 7);
        assert_eq!(args.tag_style(), TagStyle::Full);

        let config = args.session_config();
        assert_eq!(config.tagger.label_mode, LabelMode::Composed);
        assert!(!config.tagger.allowed_codes.is_empty());
        assert_eq!(config.extract.fallback_password, "aass1122");
        assert!(!config.extract.skip_header);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let args = Args::parse_from([
            "acctpack",
            "in.xlsx",
            "-s",
            "x",
            "--verbatim",
            "--any-code",
            "--skip-header",
            "--utc-offset",
            "-3",
            "--style",
            "short",
        ]);
        let config = args.session_config();
        assert_eq!(config.tagger.label_mode, LabelMode::Verbatim);
        assert!(config.tagger.allowed_codes.is_empty());
        assert!(config.extract.skip_header);
        assert_eq!(config.tagger.utc_offset_hours, -3);
        assert_eq!(config.tagger.style, TagStyle::Compact);
    }

    #[test]
    fn test_compact_conflicts_with_style() {
        let result = Args::try_parse_from([
            "acctpack", "in.txt", "-s", "RANA", "--compact", "--style", "full",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Args::try_parse_from(["acctpack", "in.txt"]).is_err());
    }

    #[test]
    fn test_style_serde() {
        let json = serde_json::to_string(&Style::Compact).unwrap();
        assert_eq!(json, "\"compact\"");
        assert_eq!(Style::Full.to_string(), "full");
    }
}
