//! Form field decoding module
//!
//! Decodes `application/x-www-form-urlencoded` input (query strings and POST
//! bodies) into key/value pairs with CGI-style lookup semantics.

/// Decode an urlencoded string into ordered key/value pairs.
///
/// Invalid percent sequences pass through literally rather than failing the
/// whole request; a field that cannot be understood surfaces later as an
/// integer parse error.
pub fn parse_pairs(input: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(input).unwrap_or_default()
}

/// First non-blank value for `name`, if any.
///
/// Repeated fields resolve to the first occurrence; a blank value behaves
/// like a missing field.
pub fn first_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Escape text for interpolation into an HTML body.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_pairs() {
        let pairs = parse_pairs("a=3&b=4");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "4".to_string())
            ]
        );
    }

    #[test]
    fn decodes_percent_and_plus() {
        let pairs = parse_pairs("a=%2D7&b=+5");
        assert_eq!(first_value(&pairs, "a"), Some("-7"));
        assert_eq!(first_value(&pairs, "b"), Some(" 5"));
    }

    #[test]
    fn first_occurrence_wins() {
        let pairs = parse_pairs("a=1&a=2");
        assert_eq!(first_value(&pairs, "a"), Some("1"));
    }

    #[test]
    fn blank_value_counts_as_absent() {
        let pairs = parse_pairs("a=&b=5");
        assert_eq!(first_value(&pairs, "a"), None);
        assert_eq!(first_value(&pairs, "b"), Some("5"));
    }

    #[test]
    fn empty_input_yields_no_pairs() {
        assert!(parse_pairs("").is_empty());
    }

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape_html(r#"<b a="1">&'"#),
            "&lt;b a=&quot;1&quot;&gt;&amp;&#39;"
        );
    }
}
