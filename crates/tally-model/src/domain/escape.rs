//! Escaping rules of the Prometheus text exposition format.

/// Escape a label value: backslash, double quote and line feed.
pub fn escape_label_value(value: &str) -> String {
    escape(value, true)
}

/// Escape `# HELP` text: backslash and line feed only.
pub fn escape_help(value: &str) -> String {
    escape(value, false)
}

fn escape(value: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '"' if quotes => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values_escape_quotes_backslashes_newlines() {
        assert_eq!(escape_label_value("plain"), "plain");
        assert_eq!(escape_label_value(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_label_value(r"C:\dir"), r"C:\\dir");
        assert_eq!(escape_label_value("a\nb"), r"a\nb");
    }

    #[test]
    fn help_keeps_quotes() {
        assert_eq!(escape_help(r#"the "answer""#), r#"the "answer""#);
        assert_eq!(escape_help("line1\nline2\\"), r"line1\nline2\\");
    }
}
