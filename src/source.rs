//! Format-specific row sources.
//!
//! Every upload is loaded into a [`RowSource`] that yields raw rows: text
//! lines for `.txt`, cell rows for `.xlsx` and `.csv`. The pipeline turns raw
//! rows into records without knowing which container they came from.
//!
//! # Example
//!
//! ```rust
//! use acctpack::config::ExtractConfig;
//! use acctpack::format::InputFormat;
//! use acctpack::source::{load_source, RawRow, RowSource};
//!
//! let source = load_source(InputFormat::Text, b"a@gmail.com pw\n", &ExtractConfig::new())?;
//! let first = source.rows().next().unwrap();
//! assert!(matches!(first, RawRow::Line { number: 1, text: "a@gmail.com pw" }));
//! # Ok::<(), acctpack::AcctpackError>(())
//! ```

use crate::classifier::Cell;
use crate::config::ExtractConfig;
use crate::error::{AcctpackError, Result};
use crate::format::InputFormat;
use crate::tokenizer;

/// One unprocessed row.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRow<'a> {
    /// A text line, numbered from 1
    Line {
        /// Line number
        number: usize,
        /// Line content without terminator
        text: &'a str,
    },
    /// A spreadsheet row, indexed from 0 at the top of the sheet
    Cells {
        /// Absolute row index
        index: usize,
        /// Cells starting at column A
        cells: &'a [Cell],
    },
}

/// A loaded upload that can be walked any number of times.
pub trait RowSource: Send + Sync {
    /// Returns the format this source was loaded from.
    fn format(&self) -> InputFormat;

    /// Iterates over the raw rows in file order.
    fn rows(&self) -> Box<dyn Iterator<Item = RawRow<'_>> + '_>;
}

/// Rows of a text upload.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
}

impl TextSource {
    /// Wraps already-decoded text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decodes UTF-8 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = String::from_utf8(bytes.to_vec()).map_err(|e| AcctpackError::Utf8 {
            context: "text upload".to_string(),
            source: e,
        })?;
        Ok(Self { text })
    }
}

impl RowSource for TextSource {
    fn format(&self) -> InputFormat {
        InputFormat::Text
    }

    fn rows(&self) -> Box<dyn Iterator<Item = RawRow<'_>> + '_> {
        Box::new(
            tokenizer::lines(&self.text)
                .enumerate()
                .map(|(i, text)| RawRow::Line { number: i + 1, text }),
        )
    }
}

/// Rows of a spreadsheet upload, with columns aligned to column A.
#[derive(Debug, Clone)]
pub struct SheetSource {
    format: InputFormat,
    first_row: usize,
    rows: Vec<Vec<Cell>>,
}

impl SheetSource {
    /// Builds a sheet from in-memory rows starting at the top-left cell.
    ///
    /// # Example
    ///
    /// ```rust
    /// use acctpack::classifier::Cell;
    /// use acctpack::source::{RowSource, SheetSource};
    ///
    /// let sheet = SheetSource::from_rows(vec![vec![Cell::from("a@gmail.com")]]);
    /// assert_eq!(sheet.rows().count(), 1);
    /// ```
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            format: InputFormat::Xlsx,
            first_row: 0,
            rows,
        }
    }

    /// Loads the first worksheet of an XLSX workbook.
    ///
    /// Only the leading `max_columns` columns of the sheet are kept.
    #[cfg(feature = "xlsx")]
    pub fn from_xlsx(bytes: &[u8], max_columns: usize) -> Result<Self> {
        use calamine::{Reader, Xlsx, open_workbook_from_rs};
        use std::io::Cursor;

        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(Cursor::new(bytes.to_vec())).map_err(AcctpackError::xlsx)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AcctpackError::workbook("XLSX", "workbook has no worksheet"))?
            .map_err(AcctpackError::xlsx)?;

        let (first_row, first_col) = range
            .start()
            .map_or((0, 0), |(r, c)| (r as usize, c as usize));
        let pad = first_col.min(max_columns);
        let keep = max_columns - pad;

        let rows = range
            .rows()
            .map(|row| {
                let mut cells = vec![Cell::Empty; pad];
                cells.extend(row.iter().take(keep).map(Cell::from));
                cells
            })
            .collect();

        Ok(Self {
            format: InputFormat::Xlsx,
            first_row,
            rows,
        })
    }

    /// Loads comma separated rows. Records with invalid UTF-8 are skipped.
    #[cfg(feature = "csv-input")]
    pub fn from_csv(bytes: &[u8], max_columns: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => rows.push(
                    record
                        .iter()
                        .take(max_columns)
                        .map(|field| {
                            if field.is_empty() {
                                Cell::Empty
                            } else {
                                Cell::from(field)
                            }
                        })
                        .collect(),
                ),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    log::warn!("skipping CSV row {}: {}", index + 1, e);
                    rows.push(Vec::new());
                }
                Err(e) => return Err(AcctpackError::csv(e)),
            }
        }

        Ok(Self {
            format: InputFormat::Csv,
            first_row: 0,
            rows,
        })
    }
}

impl RowSource for SheetSource {
    fn format(&self) -> InputFormat {
        self.format
    }

    fn rows(&self) -> Box<dyn Iterator<Item = RawRow<'_>> + '_> {
        let first_row = self.first_row;
        Box::new(self.rows.iter().enumerate().map(move |(i, cells)| RawRow::Cells {
            index: first_row + i,
            cells,
        }))
    }
}

/// Loads an upload into the row source for its format.
///
/// # Errors
///
/// - [`AcctpackError::Utf8`] for text that is not UTF-8
/// - [`AcctpackError::WorkbookLoad`] for an unreadable spreadsheet, or when
///   the format's feature is disabled
#[allow(unused_variables)]
pub fn load_source(
    format: InputFormat,
    bytes: &[u8],
    config: &ExtractConfig,
) -> Result<Box<dyn RowSource>> {
    match format {
        InputFormat::Text => Ok(Box::new(TextSource::from_bytes(bytes)?)),
        #[cfg(feature = "xlsx")]
        InputFormat::Xlsx => Ok(Box::new(SheetSource::from_xlsx(bytes, config.max_columns)?)),
        #[cfg(feature = "csv-input")]
        InputFormat::Csv => Ok(Box::new(SheetSource::from_csv(bytes, config.max_columns)?)),
        #[allow(unreachable_patterns)]
        _ => Err(AcctpackError::workbook(
            "input",
            format!(
                "Input format {} requires the '{}' feature to be enabled",
                format,
                match format {
                    InputFormat::Csv => "csv-input",
                    _ => "xlsx",
                }
            ),
        )),
    }
}
