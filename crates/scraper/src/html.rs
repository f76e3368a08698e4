//! Pattern-based HTML to text extraction.

use std::sync::LazyLock;

use datasynth_core::fetch::ScrapedPage;
use regex::Regex;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("invalid title regex"));

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("invalid script regex"));

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("invalid style regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Reduce an HTML document to its title and at most `max_chars`
/// characters of visible text.
pub fn extract_page(html: &str, max_chars: usize) -> ScrapedPage {
    let title = TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, " ");
    let text = WS_RE.replace_all(&text, " ");

    ScrapedPage {
        title,
        content: truncate_chars(text.trim(), max_chars),
    }
}

/// First `max_chars` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <TITLE lang="en">Acme Boxes</TITLE>
  <style type="text/css">body { color: red; }</style>
  <script>var tracking = "<b>not text</b>";</script>
</head>
<body>
  <h1>Eco   packaging</h1>
  <p>We make <em>compostable</em> boxes.</p>
  <SCRIPT type="module">
    console.log("multi-line");
  </SCRIPT>
</body>
</html>"#;

    #[test]
    fn extracts_title_case_insensitively() {
        let page = extract_page(PAGE, 5000);
        assert_eq!(page.title, "Acme Boxes");
    }

    #[test]
    fn strips_scripts_styles_and_tags() {
        let page = extract_page(PAGE, 5000);
        assert!(!page.content.contains("tracking"));
        assert!(!page.content.contains("color: red"));
        assert!(!page.content.contains("multi-line"));
        assert!(!page.content.contains('<'));
        assert!(page.content.contains("Eco packaging"));
        assert!(page.content.contains("We make compostable boxes."));
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        let page = extract_page("<p>  a \n\n\t b  </p>", 5000);
        assert_eq!(page.content, "a b");
    }

    #[test]
    fn collapses_unicode_space_runs() {
        let page = extract_page("<p>a\u{a0}\u{a0} \u{2003}b</p>", 5000);
        assert_eq!(page.content, "a b");

        let page = extract_page("<p>\u{a0}Acme\u{3000}Boxes\u{a0}</p>", 5000);
        assert_eq!(page.content, "Acme Boxes");
    }

    #[test]
    fn missing_title_is_empty() {
        let page = extract_page("<p>hello</p>", 5000);
        assert_eq!(page.title, "");
        assert_eq!(page.content, "hello");
    }

    #[test]
    fn content_is_bounded_by_characters() {
        let body = format!("<p>{}</p>", "é".repeat(6000));
        let page = extract_page(&body, 5000);
        assert_eq!(page.content.chars().count(), 5000);
    }

    #[test]
    fn truncate_chars_short_input_unchanged() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }
}
