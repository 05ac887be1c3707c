//! Structured extraction from free-text model replies

use super::CaptionError;
use pictura_core::CaptionResult;

/// Locate the first `{` and its matching `}`.
///
/// Braces inside JSON string literals are ignored, including escaped quotes,
/// so nested objects and values such as `"a {b}"` are handled. Returns `None`
/// when there is no opening brace or it is never closed.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Turn a model reply into a successful caption, or say why it cannot be one.
pub fn parse_caption(text: &str) -> Result<CaptionResult, CaptionError> {
    if text.trim().is_empty() {
        return Err(CaptionError::EmptyResponse);
    }

    let candidate = find_json_object(text).ok_or(CaptionError::NoJsonFound)?;

    let value: serde_json::Value = serde_json::from_str(candidate)
        .map_err(|e| CaptionError::ParseFailure(e.to_string()))?;

    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(String::from);

    Ok(CaptionResult::success(field("title"), field("description")))
}
