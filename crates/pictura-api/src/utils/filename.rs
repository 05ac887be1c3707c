//! Upload filename sanitizing

/// Reduce an uploaded filename to a safe, flat object key.
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become a single `_`, anything outside `[A-Za-z0-9_.-]` is removed and
/// leading/trailing `.`/`_` are trimmed. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
