//! Canonical account record and the builders that produce it.
//!
//! A record renders as `email|password[|recovery]|SOURCE_{tag}_SOURCE`.
//! Both builders are pure; the same inputs always give the same record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifiedFields;

/// One normalized account line.
///
/// # Example
///
/// ```rust
/// use acctpack::Record;
///
/// let record = Record::new("a@gmail.com", "pw", None, "T");
/// assert_eq!(record.to_string(), "a@gmail.com|pw|SOURCE_T_SOURCE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// First email-like field of the row; never empty
    pub email: String,
    /// Password, or the fallback literal
    pub password: String,
    /// Recovery field, when the row has one
    pub recovery: Option<String>,
    /// Tag embedded as `SOURCE_{tag}_SOURCE`
    pub source_tag: String,
}

impl Record {
    /// Creates a record from its parts.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        recovery: Option<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            recovery,
            source_tag: source_tag.into(),
        }
    }

    /// Builds a record from a gmail-filtered token list.
    ///
    /// Tokens after the third are dropped. Returns `None` for an empty list.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acctpack::Record;
    ///
    /// let r = Record::from_tokens(&["a@gmail.com"], "T", "aass1122").unwrap();
    /// assert_eq!(r.to_string(), "a@gmail.com|aass1122|SOURCE_T_SOURCE");
    ///
    /// let r = Record::from_tokens(&["a@gmail.com", "pw", "rec", "extra"], "T", "aass1122").unwrap();
    /// assert_eq!(r.to_string(), "a@gmail.com|pw|rec|SOURCE_T_SOURCE");
    /// ```
    pub fn from_tokens(tokens: &[&str], source_tag: &str, fallback_password: &str) -> Option<Self> {
        let (email, rest) = tokens.split_first()?;
        let password = rest.first().copied().unwrap_or(fallback_password);
        let recovery = rest.get(1).map(|r| (*r).to_string());
        Some(Self::new(*email, password, recovery, source_tag))
    }

    /// Builds a record from a classified spreadsheet row.
    ///
    /// Returns `None` when the row has no email-like cell.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acctpack::classifier::ClassifiedFields;
    /// use acctpack::Record;
    ///
    /// let fields = ClassifiedFields {
    ///     emails: vec!["foo@gmail.com".into(), "bar@rec.com".into()],
    ///     others: vec!["mypw".into()],
    /// };
    /// let r = Record::from_classified(&fields, "S", "aass1122").unwrap();
    /// assert_eq!(r.to_string(), "foo@gmail.com|mypw|bar@rec.com|SOURCE_S_SOURCE");
    /// ```
    pub fn from_classified(
        fields: &ClassifiedFields,
        source_tag: &str,
        fallback_password: &str,
    ) -> Option<Self> {
        let email = fields.emails.first()?;
        let password = fields
            .others
            .first()
            .map_or(fallback_password, String::as_str);
        let recovery = fields.emails.get(1).cloned();
        Some(Self::new(email.as_str(), password, recovery, source_tag))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.email, self.password)?;
        if let Some(recovery) = &self.recovery {
            write!(f, "|{}", recovery)?;
        }
        write!(f, "|SOURCE_{}_SOURCE", self.source_tag)
    }
}

/// Joins records into the output text: one record per line, no trailing newline.
pub fn join_records(records: &[Record]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
