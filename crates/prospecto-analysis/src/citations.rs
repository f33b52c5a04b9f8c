//! HTML rendering of free text with numbered citations.

use std::sync::LazyLock;

use prospecto_core::Citation;
use regex::{Captures, Regex};

static CITATION_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid citation regex"));

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Escapes `text`, turns in-range `[n]` marks into links to the nth source,
/// and converts newlines to `<br>`.
///
/// Out-of-range marks are left literal.
#[must_use]
pub fn linkify_citations(text: &str, sources: &[Citation]) -> String {
    let escaped = escape_html(text);
    let linked = CITATION_MARK.replace_all(&escaped, |caps: &Captures<'_>| {
        let mark = &caps[0];
        let Ok(n) = caps[1].parse::<usize>() else {
            return mark.to_string();
        };
        match n.checked_sub(1).and_then(|i| sources.get(i)) {
            Some(source) => format!(
                "<sup><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" title=\"{}\">[{n}]</a></sup>",
                escape_html(&source.uri),
                escape_html(&source.title),
            ),
            None => mark.to_string(),
        }
    });
    linked.replace('\n', "<br>")
}

/// Drops sources whose uri was already seen, keeping first occurrences.
#[must_use]
pub fn dedupe_citations(sources: Vec<Citation>) -> Vec<Citation> {
    let mut unique: Vec<Citation> = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.iter().any(|s| s.uri == source.uri) {
            unique.push(source);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(n: usize) -> Vec<Citation> {
        (1..=n)
            .map(|i| Citation {
                uri: format!("https://source{i}.example"),
                title: format!("Source {i}"),
            })
            .collect()
    }

    #[test]
    fn in_range_mark_becomes_link_out_of_range_stays_literal() {
        let html = linkify_citations("See [1] and [3]", &sources(2));
        assert!(html.contains("<a href=\"https://source1.example\""));
        assert!(html.contains(">[1]</a></sup>"));
        assert!(html.ends_with("and [3]"));
    }

    #[test]
    fn zero_is_never_a_valid_citation() {
        assert_eq!(linkify_citations("[0]", &sources(1)), "[0]");
    }

    #[test]
    fn text_is_escaped_before_links_are_inserted() {
        let html = linkify_citations("<b>Tom & Jerry</b> [1]", &sources(1));
        assert!(html.starts_with("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt; <sup>"));
    }

    #[test]
    fn newlines_become_breaks() {
        assert_eq!(linkify_citations("a\nb", &[]), "a<br>b");
    }

    #[test]
    fn titles_are_escaped_in_attributes() {
        let source = Citation {
            uri: "https://x.example/?a=1&b=2".to_string(),
            title: "\"Quoted\"".to_string(),
        };
        let html = linkify_citations("[1]", &[source]);
        assert!(html.contains("href=\"https://x.example/?a=1&amp;b=2\""));
        assert!(html.contains("title=\"&quot;Quoted&quot;\""));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut list = sources(2);
        list.push(Citation {
            uri: "https://source1.example".to_string(),
            title: "Duplicate".to_string(),
        });
        let unique = dedupe_citations(list);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].title, "Source 1");
    }
}
