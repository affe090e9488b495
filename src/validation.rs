//! Form field validation for submitted posts, forums and groups.

/// Longest accepted subject, name or description.
pub const MAX_LINE_CHARS: usize = 255;

/// Longest accepted author name.
pub const MAX_AUTHOR_CHARS: usize = 64;

/// Rejected form input, named after the offending field.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is too long (maximum {max})")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains invalid characters: {chars}")]
    InvalidCharacters { field: &'static str, chars: String },
}

/// Single-line field (subject, name, description): trimmed, control characters
/// removed, length limited.
pub fn clean_line(field: &'static str, value: &str, required: bool) -> Result<String, FormError> {
    let cleaned: String = value.trim().chars().filter(|c| !c.is_control()).collect();
    if required && cleaned.is_empty() {
        return Err(FormError::Empty { field });
    }
    if cleaned.chars().count() > MAX_LINE_CHARS {
        return Err(FormError::TooLong { field, max: MAX_LINE_CHARS });
    }
    Ok(cleaned)
}

/// Multi-line body: line endings normalized to `\n`, other control characters
/// except tabs removed, limited to `max_bytes`.
pub fn clean_body(value: &str, max_bytes: usize) -> Result<String, FormError> {
    if value.len() > max_bytes {
        return Err(FormError::TooLong { field: "body", max: max_bytes });
    }
    let normalized = value.replace("\r\n", "\n");
    let cleaned: String = normalized
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect();
    if cleaned.trim().is_empty() {
        return Err(FormError::Empty { field: "body" });
    }
    Ok(cleaned)
}

/// Author name typed by an anonymous poster.
pub fn clean_author(value: &str) -> Result<String, FormError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(FormError::Empty { field: "author" });
    }
    if name.chars().count() > MAX_AUTHOR_CHARS {
        return Err(FormError::TooLong { field: "author", max: MAX_AUTHOR_CHARS });
    }
    let bad: String = name
        .chars()
        .filter(|c| c.is_control() || matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect();
    if !bad.is_empty() {
        return Err(FormError::InvalidCharacters { field: "author", chars: bad });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_trimmed_and_required() {
        assert_eq!(clean_line("subject", "  Hello\u{7} ", true).unwrap(), "Hello");
        assert_eq!(clean_line("subject", "   ", true), Err(FormError::Empty { field: "subject" }));
        assert_eq!(clean_line("description", "", false).unwrap(), "");
        let long = "x".repeat(MAX_LINE_CHARS + 1);
        assert!(matches!(clean_line("name", &long, true), Err(FormError::TooLong { .. })));
    }

    #[test]
    fn body_keeps_newlines_and_tabs() {
        assert_eq!(clean_body("a\r\n\tb\u{0}", 100).unwrap(), "a\n\tb");
        assert!(clean_body("\n\n", 100).is_err());
        assert!(matches!(clean_body("abcdef", 3), Err(FormError::TooLong { max: 3, .. })));
    }

    #[test]
    fn author_rejects_markup() {
        assert_eq!(clean_author(" guest ").unwrap(), "guest");
        assert!(matches!(clean_author("<b>x</b>"), Err(FormError::InvalidCharacters { .. })));
        assert!(clean_author("").is_err());
    }
}
