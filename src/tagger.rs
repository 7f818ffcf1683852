//! Source tag composition.
//!
//! A composed tag looks like `RANA_1510_3_120-gmails_143005`:
//!
//! | Part | Meaning |
//! |------|---------|
//! | `RANA` | source code chosen by the caller |
//! | `1510` | local date as `DDMM` |
//! | `3` | per-day sequence number for this code |
//! | `120-gmails` | number of records in the file |
//! | `143005` | local time as `HHMMSS` |
//!
//! Local time uses a fixed offset from UTC ([`TaggerConfig::utc_offset_hours`],
//! +7 by default), so the day boundary does not depend on the host timezone.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::config::{LabelMode, TagStyle, TaggerConfig};
use crate::counter::DailyCounterStore;
use crate::error::{AcctpackError, Result};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
///
/// # Example
///
/// ```rust
/// use acctpack::tagger::{Clock, FixedClock};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 10, 15, 8, 0, 0).unwrap());
/// clock.advance(Duration::hours(1));
/// assert_eq!(clock.now_utc(), Utc.with_ymd_and_hms(2024, 10, 15, 9, 0, 0).unwrap());
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A validated source label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLabel {
    /// Short code to be expanded with date, sequence, count and time
    Code(String),
    /// Label used as the tag unchanged
    Verbatim(String),
}

/// The tag embedded in every record of one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SourceTag {
    /// Tag built from a code
    Composed {
        /// Source code
        code: String,
        /// Local date, `DDMM`
        day: String,
        /// Per-day sequence number for `code`
        sequence: u32,
        /// Number of records in the delivery
        count: usize,
        /// Local time, `HHMMSS` or `HHMM`
        time: String,
        /// Layout
        #[serde(skip)]
        style: TagStyle,
    },
    /// Caller-supplied label
    Verbatim(String),
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Composed {
                code,
                day,
                sequence,
                count,
                time,
                style: TagStyle::Full,
            } => write!(f, "{code}_{day}_{sequence}_{count}-gmails_{time}"),
            SourceTag::Composed {
                code,
                day,
                sequence,
                count,
                time,
                style: TagStyle::Compact,
            } => write!(f, "{code}_{day}_{sequence}_{count}_{time}"),
            SourceTag::Verbatim(label) => f.write_str(label),
        }
    }
}

/// Turns source labels into tags, bumping the shared daily counter.
pub struct SourceTagger {
    config: TaggerConfig,
    offset: FixedOffset,
    counters: Arc<DailyCounterStore>,
    clock: Arc<dyn Clock>,
}

impl SourceTagger {
    /// Creates a tagger over a shared counter store and clock.
    ///
    /// An out-of-range offset (24 hours or more) falls back to UTC.
    pub fn new(
        config: TaggerConfig,
        counters: Arc<DailyCounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let offset = config
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!(
                    "UTC offset {}h is out of range, using UTC",
                    config.utc_offset_hours
                );
                Utc.fix()
            });
        Self {
            config,
            offset,
            counters,
            clock,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Returns the current time at the configured offset.
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        self.clock.now_utc().with_timezone(&self.offset)
    }

    /// Returns today's date at the configured offset as `DDMM`.
    pub fn today(&self) -> String {
        self.local_now().format("%d%m").to_string()
    }

    /// Validates a caller label according to the configured [`LabelMode`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use acctpack::config::TaggerConfig;
    /// use acctpack::counter::DailyCounterStore;
    /// use acctpack::tagger::{SourceLabel, SourceTagger, SystemClock};
    ///
    /// let tagger = SourceTagger::new(
    ///     TaggerConfig::new(),
    ///     Arc::new(DailyCounterStore::new()),
    ///     Arc::new(SystemClock),
    /// );
    /// assert_eq!(tagger.parse_label(" rana ").unwrap(), SourceLabel::Code("RANA".into()));
    /// assert!(tagger.parse_label("UNKNOWN").is_err());
    /// ```
    pub fn parse_label(&self, label: &str) -> Result<SourceLabel> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(AcctpackError::invalid_label(label, "label is empty"));
        }
        if trimmed.contains('|') {
            return Err(AcctpackError::invalid_label(label, "label contains '|'"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(AcctpackError::invalid_label(label, "label contains whitespace"));
        }
        if trimmed.contains(['/', '\\']) {
            return Err(AcctpackError::invalid_label(label, "label contains a path separator"));
        }

        match self.config.label_mode {
            LabelMode::Verbatim => Ok(SourceLabel::Verbatim(trimmed.to_string())),
            LabelMode::Composed => {
                let code = trimmed.to_uppercase();
                let allowed = &self.config.allowed_codes;
                if !allowed.is_empty() && !allowed.iter().any(|c| *c == code) {
                    return Err(AcctpackError::invalid_label(label, "unknown source code"));
                }
                Ok(SourceLabel::Code(code))
            }
        }
    }

    /// Builds the tag for a delivery of `count` records.
    ///
    /// For a [`SourceLabel::Code`] this increments the daily counter exactly
    /// once; call it only when the delivery is going to be produced.
    pub fn compose(&self, label: &SourceLabel, count: usize) -> SourceTag {
        match label {
            SourceLabel::Verbatim(text) => SourceTag::Verbatim(text.clone()),
            SourceLabel::Code(code) => {
                let now = self.local_now();
                let day = now.format("%d%m").to_string();
                let sequence = self.counters.next_sequence(code, &day);
                let time = match self.config.style {
                    TagStyle::Full => now.format("%H%M%S"),
                    TagStyle::Compact => now.format("%H%M"),
                }
                .to_string();
                SourceTag::Composed {
                    code: code.clone(),
                    day,
                    sequence,
                    count,
                    time,
                    style: self.config.style,
                }
            }
        }
    }
}

impl fmt::Debug for SourceTagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTagger")
            .field("config", &self.config)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tagger_at(
        config: TaggerConfig,
        now: DateTime<Utc>,
    ) -> (SourceTagger, Arc<FixedClock>, Arc<DailyCounterStore>) {
        let clock = Arc::new(FixedClock::new(now));
        let counters = Arc::new(DailyCounterStore::new());
        let tagger = SourceTagger::new(config, Arc::clone(&counters), clock.clone());
        (tagger, clock, counters)
    }

    #[test]
    fn test_compose_full_tag() {
        // 2024-10-15 07:30:05 UTC is 14:30:05 at +7
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 7, 30, 5).unwrap();
        let (tagger, _, _) = tagger_at(TaggerConfig::new(), now);

        let tag = tagger.compose(&SourceLabel::Code("RANA".into()), 120);
        assert_eq!(tag.to_string(), "RANA_1510_1_120-gmails_143005");
    }

    #[test]
    fn test_compose_compact_tag() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 7, 30, 5).unwrap();
        let (tagger, _, _) = tagger_at(TaggerConfig::new().with_style(TagStyle::Compact), now);

        let tag = tagger.compose(&SourceLabel::Code("SHA".into()), 3);
        assert_eq!(tag.to_string(), "SHA_1510_1_3_1430");
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // 18:00 UTC on the 15th is already the 16th at +7
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 18, 0, 0).unwrap();
        let (plus7, _, _) = tagger_at(TaggerConfig::new(), now);
        assert_eq!(plus7.today(), "1610");

        let (utc, _, _) = tagger_at(TaggerConfig::new().with_utc_offset_hours(0), now);
        assert_eq!(utc.today(), "1510");
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 18, 0, 0).unwrap();
        let (tagger, _, _) = tagger_at(TaggerConfig::new().with_utc_offset_hours(30), now);
        assert_eq!(tagger.today(), "1510");
    }

    #[test]
    fn test_huge_offset_falls_back_to_utc() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 18, 0, 0).unwrap();
        for hours in [1_000_000, i32::MAX, i32::MIN] {
            let (tagger, _, _) = tagger_at(TaggerConfig::new().with_utc_offset_hours(hours), now);
            assert_eq!(tagger.today(), "1510", "offset {hours}h");
        }
    }

    #[test]
    fn test_sequence_increments_then_resets_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 1, 0, 0).unwrap();
        let (tagger, clock, _) = tagger_at(TaggerConfig::new(), now);
        let rana = SourceLabel::Code("RANA".into());

        let seq = |tag: SourceTag| match tag {
            SourceTag::Composed { sequence, .. } => sequence,
            SourceTag::Verbatim(_) => unreachable!(),
        };

        assert_eq!(seq(tagger.compose(&rana, 1)), 1);
        assert_eq!(seq(tagger.compose(&rana, 1)), 2);

        clock.advance(Duration::days(1));
        assert_eq!(seq(tagger.compose(&rana, 1)), 1);
    }

    #[test]
    fn test_verbatim_does_not_touch_counter() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 1, 0, 0).unwrap();
        let (tagger, _, counters) =
            tagger_at(TaggerConfig::new().with_label_mode(LabelMode::Verbatim), now);

        let label = tagger.parse_label("my-batch").unwrap();
        assert_eq!(label, SourceLabel::Verbatim("my-batch".into()));
        assert_eq!(tagger.compose(&label, 9).to_string(), "my-batch");
        assert!(counters.snapshot().counts.is_empty());
    }

    #[test]
    fn test_parse_label_rejections() {
        let (tagger, _, _) = tagger_at(TaggerConfig::new(), Utc::now());
        assert!(tagger.parse_label("").unwrap_err().is_invalid_label());
        assert!(tagger.parse_label("RA|NA").unwrap_err().is_invalid_label());
        assert!(tagger.parse_label("RA NA").unwrap_err().is_invalid_label());
        assert!(tagger.parse_label("../x").unwrap_err().is_invalid_label());
        assert!(tagger.parse_label("OTHER").unwrap_err().is_invalid_label());
    }

    #[test]
    fn test_parse_label_any_code_when_list_empty() {
        let config = TaggerConfig::new().with_allowed_codes(Vec::<String>::new());
        let (tagger, _, _) = tagger_at(config, Utc::now());
        assert_eq!(
            tagger.parse_label("zed").unwrap(),
            SourceLabel::Code("ZED".into())
        );
    }

    #[test]
    fn test_tag_serializes_parts() {
        let now = Utc.with_ymd_and_hms(2024, 10, 15, 7, 30, 5).unwrap();
        let (tagger, _, _) = tagger_at(TaggerConfig::new(), now);
        let tag = tagger.compose(&SourceLabel::Code("BL".into()), 2);
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["code"], "BL");
        assert_eq!(json["sequence"], 1);
        assert_eq!(json["count"], 2);
    }
}
