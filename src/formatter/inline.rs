//! Inline rules applied to the text of a single line.
//!
//! Code spans, images and links are rendered first and parked behind
//! placeholders so the emphasis rules never see their contents.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{placeholder, resolve_placeholders, EscapePolicy, FormatOptions, INLINE_CLOSE, INLINE_OPEN};
use crate::helper::sanitization_helpers::{escape_code, escape_markup};

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("image pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("link pattern"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));

pub(super) fn render(line: &str, options: &FormatOptions) -> String {
    let mut spans = Vec::new();
    let text = protect_code_spans(line, &mut spans);
    let text = match options.escape {
        EscapePolicy::Escape => escape_markup(&text),
        EscapePolicy::Trusted | EscapePolicy::Sanitize => text,
    };

    // Images before links: `![alt](url)` also matches the link pattern.
    let text = IMAGE.replace_all(&text, |caps: &Captures| {
        spans.push(format!("<img src=\"{}\" alt=\"{}\">", &caps[2], &caps[1]));
        placeholder(INLINE_OPEN, INLINE_CLOSE, spans.len() - 1)
    });
    let text = LINK.replace_all(&text, |caps: &Captures| {
        // The label may hold a parked image or code span; the link itself is
        // parked next, so resolve those now.
        let label = resolve_placeholders(&emphasis(&caps[1]), INLINE_OPEN, INLINE_CLOSE, &spans);
        let target = if options.links_in_new_tab { " target=\"_blank\"" } else { "" };
        spans.push(format!("<a href=\"{}\"{target}>{label}</a>", &caps[2]));
        placeholder(INLINE_OPEN, INLINE_CLOSE, spans.len() - 1)
    });

    resolve_placeholders(&emphasis(&text), INLINE_OPEN, INLINE_CLOSE, &spans)
}

/// Bold before italic, otherwise `**` would be read as two italic markers.
fn emphasis(text: &str) -> String {
    let text = BOLD.replace_all(text, "<strong>$1</strong>");
    ITALIC.replace_all(&text, "<em>$1</em>").into_owned()
}

fn protect_code_spans(line: &str, spans: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        match after.find('`') {
            // "``" is not a span
            Some(0) => {
                out.push_str(&rest[..start + 2]);
                rest = &after[1..];
            }
            Some(end) => {
                out.push_str(&rest[..start]);
                spans.push(format!("<code>{}</code>", escape_code(&after[..end])));
                out.push_str(&placeholder(INLINE_OPEN, INLINE_CLOSE, spans.len() - 1));
                rest = &after[end + 1..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}
