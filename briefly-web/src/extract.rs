//! HTML to text.
//!
//! Text is taken from paragraph, heading (`h1`-`h4`) and `article` elements
//! in document order. Anything inside `script`, `style`, `nav`, `header` or
//! `footer` is ignored, including content elements nested in those.

use crate::types::ExtractedDocument;
use scraper::{ElementRef, Html, Node, Selector};

const SKIPPED: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Default minimum fragment length, in characters.
pub const MIN_FRAGMENT_CHARS: usize = 50;

const CONTENT_SELECTOR: &str = "p, h1, h2, h3, h4, article";

fn is_skipped(name: &str) -> bool {
    SKIPPED.contains(&name)
}

fn inside_skipped(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_skipped(a.value().name()))
}

/// Join trimmed, non-empty text nodes under `el` with single spaces, not
/// descending into skipped subtrees.
fn visible_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
            Node::Element(inner) if !is_skipped(inner.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    visible_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Fragments of at least `min_chars` characters, in document order.
pub fn extract_fragments(html: &str, min_chars: usize) -> Vec<String> {
    let Ok(selector) = Selector::parse(CONTENT_SELECTOR) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter(|el| !inside_skipped(el))
        .filter_map(|el| {
            let mut text = String::new();
            visible_text(el, &mut text);
            let text = text.trim();
            (text.chars().count() >= min_chars).then(|| text.to_string())
        })
        .collect()
}

/// Build the per-source document, or `None` when nothing usable remains.
pub fn extract_document(title: &str, html: &str, min_chars: usize) -> Option<ExtractedDocument> {
    let fragments = extract_fragments(html, min_chars);
    if fragments.is_empty() {
        return None;
    }
    let body_text = fragments.iter().fold(String::new(), |mut acc, f| {
        acc.push_str(f);
        acc.push_str("\n\n");
        acc
    });
    Some(ExtractedDocument {
        source_title: title.to_string(),
        body_text,
    })
}
