use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Whether the body carries HTML. Only known element names count: `<day>`
/// in plain text is not markup.
pub fn is_markup(body: &str) -> bool {
    lazy_static! {
        static ref MARKUP_REGEX: Regex = Regex::new(
            r"(?i)</?(p|br|hr|div|span|a|img|b|i|u|s|em|strong|small|sub|sup|mark|ul|ol|li|h[1-6]|blockquote|pre|code|figure|figcaption|table|thead|tbody|tr|td|th|video|audio|source|iframe|script|style)(\s[^<>]*)?/?>"
        ).unwrap();
    }
    MARKUP_REGEX.is_match(body)
}

/// Splits plain text into paragraphs on blank lines, each one a list of its
/// trimmed, non empty lines.
pub fn split_paragraphs(text: &str) -> Vec<Vec<String>> {
    lazy_static! {
        static ref BLANK_LINE_REGEX: Regex = Regex::new(r"\r?\n[ \t]*\r?\n").unwrap();
    }

    BLANK_LINE_REGEX.split(text)
        .map(|paragraph| {
            paragraph.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect::<Vec<String>>()
        })
        .filter(|lines| !lines.is_empty())
        .collect()
}

/// Escapes a value for a double quoted HTML attribute.
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Makes an attribute value taken from markup safe for double quotes again.
/// Entities it already holds are kept.
pub fn requote(value: &str) -> String {
    value.replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Replaces numeric character references and the named ones that can hide a
/// URL scheme.
pub fn decode_entities(value: &str) -> String {
    lazy_static! {
        static ref ENTITY_REGEX: Regex = Regex::new(
            r"&#(?:[xX](?P<hex>[0-9a-fA-F]+)|(?P<dec>[0-9]+));?|&(?P<name>[a-zA-Z]+);"
        ).unwrap();
    }

    ENTITY_REGEX.replace_all(value, |caps: &Captures| {
        let code = match (caps.name("hex"), caps.name("dec")) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (_, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            _ => None,
        };
        if let Some(c) = code.and_then(char::from_u32) {
            return c.to_string();
        }
        let named = caps.name("name").map(|n| n.as_str().to_ascii_lowercase());
        match named.as_deref() {
            Some("colon") => ":".to_string(),
            Some("tab") => "\t".to_string(),
            Some("newline") => "\n".to_string(),
            Some("amp") => "&".to_string(),
            Some("lpar") => "(".to_string(),
            Some("rpar") => ")".to_string(),
            _ => caps[0].to_string(),
        }
    }).to_string()
}

/// Whether a link would run code when followed: `javascript:`, `vbscript:`
/// and `data:` schemes, also when spelled with entities, blanks or control
/// characters.
pub fn is_script_url(value: &str) -> bool {
    const SCRIPT_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

    let compact: String = decode_entities(value).chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    SCRIPT_SCHEMES.iter().any(|scheme| compact.starts_with(scheme))
}

/// The link itself, or `None` when it must not end up in an `href`.
pub fn safe_href(value: &str) -> Option<&str> {
    if is_script_url(value) {
        None
    } else {
        Some(value)
    }
}

/// Value of an attribute inside a single tag, quoted or not.
pub fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(r#"(?i)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(tag)?;
    caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markup() {
        assert!(is_markup("<p>Hello</p>"));
        assert!(is_markup("line<br/>line"));
        assert!(is_markup("<IMG SRC=\"a.png\">"));
        assert!(is_markup("x <a href=\"#\">y</a>"));
        assert!(!is_markup("World"));
        assert!(!is_markup("Second <day>."));
        assert!(!is_markup("1 < 2 and 3 > 2"));
        assert!(!is_markup("<paragraph>"));
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "First line\r\nsecond line\n\n\n  Next   \n \nLast";
        assert_eq!(split_paragraphs(text), vec![
            vec!["First line".to_string(), "second line".to_string()],
            vec!["Next".to_string()],
            vec!["Last".to_string()],
        ]);
        assert!(split_paragraphs("  \n\n ").is_empty());
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a "b" <c> & 'd'"#), "a &quot;b&quot; &lt;c&gt; &amp; &#39;d&#39;");
        assert_eq!(escape_attr("images/plain.png"), "images/plain.png");
    }

    #[test]
    fn test_requote() {
        assert_eq!(requote(r#"say "hi" &amp; <go>"#), "say &quot;hi&quot; &amp; &lt;go&gt;");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&#106;&#x61;&#X76;a"), "java");
        assert_eq!(decode_entities("a&colon;b&Tab;c"), "a:b\tc");
        assert_eq!(decode_entities("&#106avascript"), "javascript");
        assert_eq!(decode_entities("&nbsp;&copy;"), "&nbsp;&copy;");
    }

    #[test]
    fn test_script_urls() {
        assert!(is_script_url("javascript:alert(1)"));
        assert!(is_script_url("  JaVaScRiPt:alert(1)"));
        assert!(is_script_url("java\tscript:alert(1)"));
        assert!(is_script_url("\u{1}javascript:alert(1)"));
        assert!(is_script_url("&#106;avascript:alert(1)"));
        assert!(is_script_url("vbscript:msgbox"));
        assert!(is_script_url("data:text/html,<script>x</script>"));

        assert!(!is_script_url("https://example.com/javascript:x"));
        assert!(!is_script_url("images/javascript.png"));
        assert!(!is_script_url("mailto:jane@example.com"));

        assert_eq!(safe_href("https://example.com"), Some("https://example.com"));
        assert_eq!(safe_href("javascript:alert(1)"), None);
    }

    #[test]
    fn test_attr_value() {
        let tag = r#"<img class="x" src="https://a/b.png" alt='it''s' data-id=9>"#;
        assert_eq!(attr_value(tag, "src"), Some("https://a/b.png"));
        assert_eq!(attr_value(tag, "alt"), Some("it"));
        assert_eq!(attr_value(tag, "data-id"), Some("9"));
        assert_eq!(attr_value(tag, "title"), None);
        // Not confused by a longer attribute name
        assert_eq!(attr_value(r#"<img data-src="x" src="y">"#, "src"), Some("y"));
    }
}
