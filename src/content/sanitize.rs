use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::content::parsing_utils::is_script_url;

/// Elements dropped together with everything inside them.
const BLOCK_ELEMENTS: [&str; 4] = ["script", "style", "iframe", "object"];

lazy_static! {
    static ref BLOCK_REGEXES: Vec<Regex> = BLOCK_ELEMENTS.iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect();

    // Leftover opening or closing tags, content is kept
    static ref BLOCKED_TAG_REGEX: Regex = Regex::new(
        r"(?i)</?(script|style|iframe|object|embed|form|base|meta|link|frame|frameset)\b[^>]*>"
    ).unwrap();

    static ref TAG_REGEX: Regex = Regex::new(r"<[a-zA-Z][^>]*>").unwrap();

    // Quoted values are matched first so nothing inside them is taken for
    // an attribute. `/` separates attributes like whitespace does.
    static ref EVENT_ATTR_REGEX: Regex = Regex::new(
        r#"(?i)"[^"]*"|'[^']*'|(?P<handler>[\s/]+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))"#
    ).unwrap();

    static ref URL_ATTR_REGEX: Regex = Regex::new(
        r#"(?i)"[^"]*"|'[^']*'|[\s/]+(?P<name>href|src|action|formaction|poster|xlink:href)\s*=\s*(?P<value>"[^"]*"|'[^']*'|[^\s>]+)"#
    ).unwrap();
}

fn clean_tag(tag: &str) -> String {
    let tag = EVENT_ATTR_REGEX.replace_all(tag, |caps: &Captures| match caps.name("handler") {
        Some(_) => String::new(),
        None => caps[0].to_string(),
    });

    URL_ATTR_REGEX.replace_all(&tag, |caps: &Captures| match (caps.name("name"), caps.name("value")) {
        (Some(name), Some(value)) if is_script_url(value.as_str().trim_matches(|c| c == '"' || c == '\'')) => {
            format!(r##" {}="#""##, name.as_str())
        }
        _ => caps[0].to_string(),
    }).to_string()
}

/// Strips active content from post HTML: script-like elements, event handler
/// attributes and script URLs (`javascript:`, `vbscript:`, `data:`). Everything
/// else is left untouched.
pub fn sanitize(html: &str) -> String {
    let mut html = html.to_string();
    for re in BLOCK_REGEXES.iter() {
        html = re.replace_all(&html, "").to_string();
    }
    let html = BLOCKED_TAG_REGEX.replace_all(&html, "");

    TAG_REGEX.replace_all(&html, |caps: &Captures| clean_tag(&caps[0])).to_string()
}
