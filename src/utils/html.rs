use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// List items directly under a top-level ordered list.
static QUESTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body > ol > li").expect("question selector is valid"));

static LEADING_LI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<li>").expect("leading <li> pattern is valid"));

static TRAILING_LI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</li>\s*$").expect("trailing </li> pattern is valid"));

/// Escapes text for interpolation into an HTML template using ammonia.
///
/// Unlike `ammonia::clean`, nothing is kept as markup: every character that
/// could open a tag or an attribute is entity-encoded.
pub fn escape_text(input: &str) -> String {
    ammonia::clean_text(input)
}

/// Slices a standalone HTML document into question fragments.
///
/// Each `body > ol > li` is serialized back to HTML and loses its bare
/// `<li>` wrapper. Documents without such a list yield no fragments.
pub fn extract_question_fragments(document: &str) -> Vec<String> {
    let document = Html::parse_document(document);
    document
        .select(&QUESTION_SELECTOR)
        .map(|item| strip_list_item(&item.html()))
        .collect()
}

/// Removes a literal `<li>` prefix and `</li>` suffix.
/// Items whose opening tag carries attributes are returned unchanged at the front.
pub fn strip_list_item(fragment: &str) -> String {
    let fragment = LEADING_LI.replace(fragment, "");
    TRAILING_LI.replace(&fragment, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_list_item() {
        assert_eq!(strip_list_item("<li>What is 2 + 2?</li>"), "What is 2 + 2?");
        assert_eq!(strip_list_item("<li><p>Explain.</p>\n</li>\n"), "<p>Explain.</p>\n");
        assert_eq!(
            strip_list_item(r#"<li class="q">Keep</li>"#),
            r#"<li class="q">Keep"#
        );
    }

    #[test]
    fn test_extract_top_level_items_only() {
        let html = r#"<!DOCTYPE html>
<html><head><title>exam</title></head>
<body>
<ol type="1">
<li>First <em>question</em></li>
<li><p>Second</p>
<ol><li>nested a</li><li>nested b</li></ol></li>
<li>Third</li>
</ol>
<div><ol><li>not a question</li></ol></div>
</body></html>"#;

        let questions = extract_question_fragments(html);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "First <em>question</em>");
        assert!(questions[1].starts_with("<p>Second</p>"));
        assert!(questions[1].contains("<li>nested a</li>"));
        assert_eq!(questions[2], "Third");
    }

    #[test]
    fn test_extract_without_list_is_empty() {
        let html = "<html><body><p>No questions here.</p></body></html>";
        assert!(extract_question_fragments(html).is_empty());
    }

    #[test]
    fn test_escape_text() {
        let escaped = escape_text("<script>alert(1)</script>");
        assert!(!escaped.contains('<'));
        assert!(escaped.starts_with("&lt;script&gt;"));
        assert!(escape_text("Jan Novák").contains("Novák"));
    }
}
