//! Identifier sanitization and string escaping for script output

/// Sanitize free text into a safe script identifier: lowercase, every run
/// of non-alphanumeric characters collapsed to a single underscore, no
/// leading digit, no leading/trailing underscore.
pub fn sanitize_identifier(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_underscore = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_underscore = false;
        } else if !last_was_underscore && !out.is_empty() {
            out.push('_');
            last_was_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Escape text for a double-quoted script string. Ren'Py additionally
/// treats `[` and `{` as interpolation openers, so they are doubled.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '[' => out.push_str("[["),
            '{' => out.push_str("{{"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_lowercases_and_collapses() {
        assert_eq!(sanitize_identifier("Tavern Keeper"), "tavern_keeper");
        assert_eq!(sanitize_identifier("  What?!  Now...  "), "what_now");
        assert_eq!(sanitize_identifier("trust"), "trust");
    }

    #[test]
    fn test_sanitize_no_leading_digit() {
        assert_eq!(sanitize_identifier("3rd visit"), "_3rd_visit");
    }

    #[test]
    fn test_sanitize_degenerate_input() {
        assert_eq!(sanitize_identifier(""), "");
        assert_eq!(sanitize_identifier("!!!"), "");
    }

    #[test]
    fn test_escape_quotes_and_interpolation() {
        assert_eq!(escape_text("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_text("a[b]{c}"), "a[[b]{{c}");
        assert_eq!(escape_text("line\nbreak"), "line\\nbreak");
    }
}
