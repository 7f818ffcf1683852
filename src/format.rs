//! Input format types.
//!
//! Uploads are classified by file extension before anything is downloaded or
//! parsed. Anything that is not a text file or a spreadsheet is rejected with
//! [`AcctpackError::UnsupportedFormat`].
//!
//! # Example
//!
//! ```rust
//! use acctpack::format::InputFormat;
//!
//! let format = InputFormat::from_file_name("accounts.XLSX").unwrap();
//! assert_eq!(format, InputFormat::Xlsx);
//! assert_eq!(format.extension(), "xlsx");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AcctpackError;

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum InputFormat {
    /// Plain text, one candidate record per line
    #[default]
    Text,

    /// Excel workbook, first worksheet, first 5 columns
    Xlsx,

    /// Comma separated rows, first 5 columns
    Csv,
}

impl InputFormat {
    /// Returns the file extension for this format (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            InputFormat::Text => "txt",
            InputFormat::Xlsx => "xlsx",
            InputFormat::Csv => "csv",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            InputFormat::Text => "text/plain",
            InputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            InputFormat::Csv => "text/csv",
        }
    }

    /// Detects the format from a file name, case-insensitively.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acctpack::format::InputFormat;
    ///
    /// assert_eq!(InputFormat::from_file_name("list.txt").unwrap(), InputFormat::Text);
    /// assert!(InputFormat::from_file_name("list.pdf").is_err());
    /// assert!(InputFormat::from_file_name("txt").is_err());
    /// ```
    pub fn from_file_name(file_name: &str) -> Result<Self, AcctpackError> {
        let ext = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => return Err(AcctpackError::unsupported_format(file_name)),
        };

        match ext.as_str() {
            "txt" => Ok(InputFormat::Text),
            "xlsx" => Ok(InputFormat::Xlsx),
            "csv" => Ok(InputFormat::Csv),
            _ => Err(AcctpackError::unsupported_format(file_name)),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Text => write!(f, "TXT"),
            InputFormat::Xlsx => write!(f, "XLSX"),
            InputFormat::Csv => write!(f, "CSV"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name() {
        assert_eq!(
            InputFormat::from_file_name("a.txt").unwrap(),
            InputFormat::Text
        );
        assert_eq!(
            InputFormat::from_file_name("A.TXT").unwrap(),
            InputFormat::Text
        );
        assert_eq!(
            InputFormat::from_file_name("batch.01.xlsx").unwrap(),
            InputFormat::Xlsx
        );
        assert_eq!(
            InputFormat::from_file_name("rows.csv").unwrap(),
            InputFormat::Csv
        );
    }

    #[test]
    fn test_from_file_name_rejects() {
        for name in ["a.xls", "a.png", "noext", ".txt", "archive.txt.zip"] {
            let err = InputFormat::from_file_name(name).unwrap_err();
            assert!(err.is_rejected_upload(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_format_display_and_extension() {
        for format in [InputFormat::Text, InputFormat::Xlsx, InputFormat::Csv] {
            assert_eq!(format.to_string().to_lowercase(), format.extension());
        }
        assert_eq!(InputFormat::Text.mime_type(), "text/plain");
        assert_eq!(InputFormat::Csv.mime_type(), "text/csv");
    }
}
