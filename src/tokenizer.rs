//! Whitespace tokenizer for text uploads.
//!
//! A text line is a candidate record only when its first token looks like a
//! Gmail address. Everything else is dropped silently; malformed lines are
//! never reported as errors.

const BOM: char = '\u{feff}';

/// Splits a line into non-empty tokens, collapsing any run of whitespace.
///
/// # Example
///
/// ```rust
/// use acctpack::tokenizer::tokenize;
///
/// assert_eq!(tokenize("  a@gmail.com \t pw  "), vec!["a@gmail.com", "pw"]);
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Returns `true` if `token` contains `marker`, ignoring case.
///
/// `marker` is expected in lowercase.
pub fn token_has_marker(token: &str, marker: &str) -> bool {
    token.to_lowercase().contains(marker)
}

/// Tokenizes a line and keeps it only if the first token carries `marker`.
///
/// # Example
///
/// ```rust
/// use acctpack::tokenizer::candidate_tokens;
///
/// let tokens = candidate_tokens("User@GMAIL.com secret", "@gmail.com").unwrap();
/// assert_eq!(tokens, vec!["User@GMAIL.com", "secret"]);
///
/// assert!(candidate_tokens("user@yahoo.com secret", "@gmail.com").is_none());
/// assert!(candidate_tokens("", "@gmail.com").is_none());
/// ```
pub fn candidate_tokens<'a>(line: &'a str, marker: &str) -> Option<Vec<&'a str>> {
    let marker = marker.to_lowercase();
    let tokens = tokenize(line);
    match tokens.first() {
        Some(first) if token_has_marker(first, &marker) => Some(tokens),
        _ => None,
    }
}

/// Splits text into lines on `\n`, `\r\n` or a lone `\r`, dropping a leading
/// byte-order mark.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.strip_prefix(BOM)
        .unwrap_or(text)
        .split(['\n', '\r'])
}

/// Checks whether a pasted block can stand in for an uploaded file.
///
/// The block qualifies when it has at least two non-empty lines and every
/// non-empty line has a marker-bearing first token followed by at least one
/// more token.
///
/// # Example
///
/// ```rust
/// use acctpack::tokenizer::is_pasted_list;
///
/// assert!(is_pasted_list("a@gmail.com p1\nb@gmail.com p2", "@gmail.com"));
/// assert!(!is_pasted_list("a@gmail.com p1", "@gmail.com"));
/// assert!(!is_pasted_list("a@gmail.com p1\nhello there", "@gmail.com"));
/// ```
pub fn is_pasted_list(text: &str, marker: &str) -> bool {
    let mut seen = 0usize;
    for line in lines(text) {
        if line.trim().is_empty() {
            continue;
        }
        match candidate_tokens(line, marker) {
            Some(tokens) if tokens.len() >= 2 => seen += 1,
            _ => return false,
        }
    }
    seen >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "@gmail.com";

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(
            tokenize("a@gmail.com\t\tpw   rec"),
            vec!["a@gmail.com", "pw", "rec"]
        );
        assert_eq!(tokenize("a@gmail.com\u{3000}pw"), vec!["a@gmail.com", "pw"]);
    }

    #[test]
    fn test_candidate_requires_marker_on_first_token() {
        assert!(candidate_tokens("pw a@gmail.com", MARKER).is_none());
        assert!(candidate_tokens("a@googlemail.com pw", MARKER).is_none());
        assert!(candidate_tokens("A@Gmail.Com", MARKER).is_some());
    }

    #[test]
    fn test_candidate_keeps_original_case() {
        let tokens = candidate_tokens("Mixed@GMail.com PassWord", MARKER).unwrap();
        assert_eq!(tokens[0], "Mixed@GMail.com");
        assert_eq!(tokens[1], "PassWord");
    }

    #[test]
    fn test_candidate_marker_case_insensitive_both_ways() {
        assert!(candidate_tokens("a@gmail.com", "@GMAIL.COM").is_some());
    }

    #[test]
    fn test_lines_handles_all_terminators() {
        let collected: Vec<_> = lines("a\r\nb\rc\nd").filter(|l| !l.is_empty()).collect();
        assert_eq!(collected, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_lines_strips_bom() {
        let first = lines("\u{feff}a@gmail.com pw\nb").next().unwrap();
        assert_eq!(first, "a@gmail.com pw");
    }

    #[test]
    fn test_pasted_list_ignores_blank_lines() {
        assert!(is_pasted_list(
            "\n a@gmail.com p1 \n\n b@gmail.com p2 r2\n",
            MARKER
        ));
    }

    #[test]
    fn test_pasted_list_needs_password_on_every_line() {
        assert!(!is_pasted_list("a@gmail.com p1\nb@gmail.com", MARKER));
        assert!(!is_pasted_list("", MARKER));
    }
}
