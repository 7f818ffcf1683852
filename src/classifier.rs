//! Spreadsheet row classification.
//!
//! Each row is reduced to two ordered buckets: cells that look like email
//! addresses and everything else. The email test is deliberately cheap (the
//! cell contains both `@` and `.`); real address validation is out of scope.

use thiserror::Error;

/// One spreadsheet cell, independent of the container it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text value
    Text(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Spreadsheet error value such as `#REF!`
    Error(String),
}

impl Cell {
    /// Renders the cell as text, or `None` for empty cells.
    ///
    /// Whole floats drop their fractional part so that a numeric password
    /// stored as `123456.0` reads back as `123456`.
    fn render(&self) -> Result<Option<String>, RowParseError> {
        Ok(match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", *f as i64))
            }
            Cell::Float(f) => Some(f.to_string()),
            Cell::Bool(true) => Some("TRUE".to_string()),
            Cell::Bool(false) => Some("FALSE".to_string()),
            Cell::Error(e) => return Err(RowParseError::ErrorCell(e.clone())),
        })
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

#[cfg(feature = "xlsx")]
impl From<&calamine::Data> for Cell {
    fn from(data: &calamine::Data) -> Self {
        use calamine::Data;
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::Error(e) => Cell::Error(e.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A row that could not be classified. The pipeline skips such rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowParseError {
    /// The row holds a spreadsheet error value
    #[error("cell holds spreadsheet error {0}")]
    ErrorCell(String),
}

/// Cells of one row split into email-like and other values, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedFields {
    /// Cells containing both `@` and `.`
    pub emails: Vec<String>,
    /// Every other non-empty cell
    pub others: Vec<String>,
}

impl ClassifiedFields {
    /// Returns `true` if the row can produce a record.
    pub fn has_email(&self) -> bool {
        !self.emails.is_empty()
    }
}

/// The cheap email test used for spreadsheet cells.
///
/// # Example
///
/// ```rust
/// use acctpack::classifier::is_email_like;
///
/// assert!(is_email_like("bar@rec.com"));
/// assert!(!is_email_like("mypw"));
/// assert!(!is_email_like("user@localhost"));
/// ```
pub fn is_email_like(text: &str) -> bool {
    text.contains('@') && text.contains('.')
}

/// Classifies up to `max_columns` leading cells of a row.
///
/// Cells beyond `max_columns` are ignored, as are cells that are empty after
/// trimming.
///
/// # Example
///
/// ```rust
/// use acctpack::classifier::{classify_row, Cell};
///
/// let row = [
///     Cell::from("foo@gmail.com"),
///     Cell::from("bar@rec.com"),
///     Cell::from("mypw"),
///     Cell::Empty,
///     Cell::Empty,
/// ];
/// let fields = classify_row(&row, 5).unwrap();
/// assert_eq!(fields.emails, ["foo@gmail.com", "bar@rec.com"]);
/// assert_eq!(fields.others, ["mypw"]);
/// ```
pub fn classify_row(cells: &[Cell], max_columns: usize) -> Result<ClassifiedFields, RowParseError> {
    let mut fields = ClassifiedFields::default();

    for cell in cells.iter().take(max_columns) {
        let Some(rendered) = cell.render()? else {
            continue;
        };
        let text = rendered.trim();
        if text.is_empty() {
            continue;
        }
        if is_email_like(text) {
            fields.emails.push(text.to_string());
        } else {
            fields.others.push(text.to_string());
        }
    }

    Ok(fields)
}
