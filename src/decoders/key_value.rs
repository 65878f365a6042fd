// Line-oriented `key=value` parsing shared by the ENV, Properties and INI decoders.

use tracing::debug;

use crate::types::{DataMap, Value};

/// Line comment markers, honoured by every key/value format
pub(crate) const COMMENT_PREFIXES: &[char] = &['#', ';', '!'];

pub(crate) fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with(COMMENT_PREFIXES)
}

/// Split a trimmed line on the first `=`.
///
/// Both sides are trimmed and one matching pair of quotes is removed from the
/// value. Lines without `=` or with an empty key yield `None`.
pub(crate) fn split_pair(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        debug!("skipping line with empty key: {}", line);
        return None;
    }
    Some((key.to_string(), strip_quotes(value.trim()).to_string()))
}

pub(crate) fn strip_quotes(value: &str) -> &str {
    if value.len() < 2 {
        return value;
    }
    for quote in ['"', '\''] {
        if value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse flat `key=value` text; later duplicates win.
pub(crate) fn parse_flat(text: &str) -> DataMap {
    let mut result = DataMap::new();
    for line in text.lines().map(str::trim) {
        if is_skippable(line) {
            continue;
        }
        if let Some((key, value)) = split_pair(line) {
            result.insert(key, Value::String(value));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"quoted\""), "quoted");
        assert_eq!(strip_quotes("'single'"), "single");
        assert_eq!(strip_quotes("\"mismatched'"), "\"mismatched'");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("plain"), "plain");
    }

    #[test]
    fn test_split_pair_uses_first_separator() {
        assert_eq!(
            split_pair("url = postgres://h/db?sslmode=require"),
            Some(("url".to_string(), "postgres://h/db?sslmode=require".to_string()))
        );
    }

    #[test]
    fn test_split_pair_rejects_empty_key_and_missing_separator() {
        assert_eq!(split_pair("= value"), None);
        assert_eq!(split_pair("just text"), None);
    }

    #[test]
    fn test_parse_flat_skips_comments_and_blank_lines() {
        let text = "# header\n\nA=1\r\n  B = \"two\"  \n!C=3\n;D=4\n";
        let data = parse_flat(text);
        assert_eq!(data.len(), 2);
        assert_eq!(data["A"], Value::from("1"));
        assert_eq!(data["B"], Value::from("two"));
    }
}
