//! Helpers for keeping user-supplied text (subjects, bodies, query strings) on a single
//! log line.

/// Longest preview of user text written to the log, in characters.
const MAX_PREVIEW: usize = 120;

/// Escape a string for single-line logging.
///
/// Newlines, carriage returns, tabs and backslashes are written as their escape
/// sequences, other control characters as `\xNN`. Text longer than 120 characters
/// is cut and terminated with an ellipsis.
pub fn escape_log(s: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count == MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn multi_line_body_stays_on_one_line() {
        assert_eq!(escape_log("> quoted\nreply\tok"), "> quoted\\nreply\\tok");
    }

    #[test]
    fn long_body_is_truncated() {
        let body = "x".repeat(500);
        let esc = escape_log(&body);
        assert_eq!(esc.chars().count(), 121);
        assert!(esc.ends_with('…'));
    }

    #[test]
    fn control_chars_become_hex() {
        assert_eq!(escape_log("a\u{7}b"), "a\\x07b");
    }
}
