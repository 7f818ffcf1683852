//! Edge case tests for acctpack
//!
//! These tests cover boundary conditions of the parsers and the tagger that
//! are not covered by the unit and integration tests.

use acctpack::classifier::{Cell, classify_row};
use acctpack::config::{DEFAULT_MAX_UPLOAD_BYTES, ExtractConfig, SessionConfig};
use acctpack::counter::DailyCounterStore;
use acctpack::format::InputFormat;
use acctpack::pipeline::{Pass, extract};
use acctpack::session::{SessionId, SessionService};
use acctpack::source::{SheetSource, TextSource};
use acctpack::tagger::FixedClock;
use acctpack::tokenizer::{candidate_tokens, is_pasted_list};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

fn run_text(text: &str) -> Vec<String> {
    extract(
        &TextSource::new(text),
        Pass::Final { tag: "T" },
        &ExtractConfig::new(),
    )
    .records
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn run_sheet(rows: Vec<Vec<Cell>>) -> Vec<String> {
    extract(
        &SheetSource::from_rows(rows),
        Pass::Final { tag: "T" },
        &ExtractConfig::new(),
    )
    .records
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn service(temp: &tempfile::TempDir) -> SessionService {
    SessionService::new(
        SessionConfig::new().with_temp_dir(temp.path()),
        Arc::new(DailyCounterStore::new()),
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
    )
}

// =========================================================================
// Text lines
// =========================================================================

#[test]
fn test_gmail_marker_must_be_in_first_token() {
    assert!(run_text("password user@gmail.com").is_empty());
    assert_eq!(run_text("user@gmail.com password"), vec![
        "user@gmail.com|password|SOURCE_T_SOURCE"
    ]);
}

#[test]
fn test_gmail_marker_is_case_insensitive() {
    assert_eq!(run_text("Mixed@GMail.COM pw"), vec![
        "Mixed@GMail.COM|pw|SOURCE_T_SOURCE"
    ]);
}

#[test]
fn test_gmail_marker_as_substring() {
    // "@gmail.com" anywhere in the token counts
    assert_eq!(candidate_tokens("x@gmail.com.evil pw", "@gmail.com").unwrap().len(), 2);
    assert!(candidate_tokens("x@googlemail.com pw", "@gmail.com").is_none());
}

#[test]
fn test_tabs_and_runs_of_spaces() {
    assert_eq!(run_text("\t a@gmail.com \t\t pw   rec \t"), vec![
        "a@gmail.com|pw|rec|SOURCE_T_SOURCE"
    ]);
}

#[test]
fn test_only_blank_lines() {
    assert!(run_text("").is_empty());
    assert!(run_text("\n\n   \r\n\t\n").is_empty());
}

#[test]
fn test_lone_carriage_returns() {
    assert_eq!(run_text("a@gmail.com 1\rb@gmail.com 2"), vec![
        "a@gmail.com|1|SOURCE_T_SOURCE",
        "b@gmail.com|2|SOURCE_T_SOURCE",
    ]);
}

#[test]
fn test_unicode_passwords_pass_through() {
    assert_eq!(run_text("a@gmail.com пароль🔑 восст"), vec![
        "a@gmail.com|пароль🔑|восст|SOURCE_T_SOURCE"
    ]);
}

#[test]
fn test_pipe_inside_token_is_not_escaped() {
    // Shape checks only; content is copied as-is
    assert_eq!(run_text("a@gmail.com p|w"), vec!["a@gmail.com|p|w|SOURCE_T_SOURCE"]);
}

#[test]
fn test_pasted_list_thresholds() {
    let marker = "@gmail.com";
    assert!(!is_pasted_list("a@gmail.com pw", marker));
    assert!(!is_pasted_list("a@gmail.com\nb@gmail.com", marker));
    assert!(!is_pasted_list("a@gmail.com pw\nhello there", marker));
    assert!(is_pasted_list("a@gmail.com pw\n\n  b@gmail.com pw  \n", marker));
}

// =========================================================================
// Spreadsheet rows
// =========================================================================

#[test]
fn test_numeric_password_cell() {
    assert_eq!(
        run_sheet(vec![vec![Cell::from("a@gmail.com"), Cell::Float(123_456.0)]]),
        vec!["a@gmail.com|123456|SOURCE_T_SOURCE"]
    );
    assert_eq!(
        run_sheet(vec![vec![Cell::from("a@gmail.com"), Cell::Int(42)]]),
        vec!["a@gmail.com|42|SOURCE_T_SOURCE"]
    );
}

#[test]
fn test_fractional_float_keeps_decimals() {
    assert_eq!(
        run_sheet(vec![vec![Cell::from("a@gmail.com"), Cell::Float(1.5)]]),
        vec!["a@gmail.com|1.5|SOURCE_T_SOURCE"]
    );
}

#[test]
fn test_zero_and_false_are_values() {
    let fields = classify_row(&[Cell::Int(0), Cell::Bool(false)], 5).unwrap();
    assert_eq!(fields.others, vec!["0", "FALSE"]);
}

#[test]
fn test_email_in_late_column() {
    assert_eq!(
        run_sheet(vec![vec![
            Cell::from("pw"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::from("late@gmail.com"),
        ]]),
        vec!["late@gmail.com|pw|SOURCE_T_SOURCE"]
    );
}

#[test]
fn test_sixth_column_ignored() {
    let row = vec![
        Cell::from("a"),
        Cell::from("b"),
        Cell::from("c"),
        Cell::from("d"),
        Cell::from("e"),
        Cell::from("f@gmail.com"),
    ];
    assert!(run_sheet(vec![row]).is_empty());
}

#[test]
fn test_whitespace_cells_are_empty() {
    assert_eq!(
        run_sheet(vec![vec![
            Cell::from("  a@gmail.com  "),
            Cell::from("   "),
            Cell::from(" pw "),
        ]]),
        vec!["a@gmail.com|pw|SOURCE_T_SOURCE"]
    );
}

#[test]
fn test_non_gmail_email_accepted_in_sheets() {
    assert_eq!(
        run_sheet(vec![vec![Cell::from("x@corp.io"), Cell::from("pw")]]),
        vec!["x@corp.io|pw|SOURCE_T_SOURCE"]
    );
}

#[test]
fn test_error_cell_row_skipped() {
    let rows = vec![
        vec![Cell::from("a@gmail.com"), Cell::Error("#N/A".into())],
        vec![Cell::from("b@gmail.com")],
    ];
    assert_eq!(run_sheet(rows), vec!["b@gmail.com|aass1122|SOURCE_T_SOURCE"]);
}

// =========================================================================
// Upload limits and file names
// =========================================================================

#[test]
fn test_size_limit_is_inclusive() {
    let temp = tempfile::tempdir().unwrap();
    let service = service(&temp);
    let body = b"a@gmail.com pw";

    assert!(
        service
            .submit_file(SessionId(1), "a.txt", DEFAULT_MAX_UPLOAD_BYTES, body)
            .is_ok()
    );
    let err = service
        .submit_file(SessionId(1), "a.txt", DEFAULT_MAX_UPLOAD_BYTES + 1, body)
        .unwrap_err();
    assert!(err.is_rejected_upload());
}

#[test]
fn test_actual_size_counts_when_declared_is_smaller() {
    let temp = tempfile::tempdir().unwrap();
    let service = SessionService::new(
        SessionConfig::new()
            .with_temp_dir(temp.path())
            .with_max_upload_bytes(8),
        Arc::new(DailyCounterStore::new()),
        Arc::new(FixedClock::new(Utc::now())),
    );
    let err = service
        .submit_file(SessionId(1), "a.txt", 1, b"a@gmail.com pw")
        .unwrap_err();
    assert!(err.is_rejected_upload());
}

#[test]
fn test_extension_checked_before_size() {
    let temp = tempfile::tempdir().unwrap();
    let service = service(&temp);
    let err = service
        .submit_file(SessionId(1), "huge.docx", u64::MAX, b"")
        .unwrap_err();
    assert!(err.to_string().contains("Unsupported file"));
}

#[test]
fn test_file_name_detection() {
    assert_eq!(InputFormat::from_file_name("LIST.TXT").unwrap(), InputFormat::Text);
    assert_eq!(InputFormat::from_file_name("a.b.xlsx").unwrap(), InputFormat::Xlsx);
    assert!(InputFormat::from_file_name(".txt").is_err());
    assert!(InputFormat::from_file_name("noext").is_err());
    assert!(InputFormat::from_file_name("old.xls").is_err());
}

#[test]
fn test_empty_upload_is_empty_result() {
    let temp = tempfile::tempdir().unwrap();
    let service = service(&temp);
    let preview = service.submit_file(SessionId(1), "a.txt", 0, b"").unwrap();
    assert_eq!(preview.count, 0);
    assert!(
        service
            .submit_source_label(SessionId(1), "RANA")
            .unwrap_err()
            .is_empty_result()
    );
}
