//! Line scanner for block structure.
//!
//! Blank lines end blocks. Headings, blockquote runs, list runs and standalone
//! code block placeholders also end the current paragraph and become blocks of
//! their own. Blocks are joined with a blank line; line breaks inside a
//! paragraph become `<br>`.

use super::{inline, is_placeholder, FormatOptions, FENCE_CLOSE, FENCE_OPEN};

/// Rendered blocks that start with one of these are never wrapped in `<p>`.
const BLOCK_TAGS: &[&str] = &[
    "<p>", "<img", "<ul>", "<ol>", "<blockquote>", "<h1>", "<h2>", "<h3>", "<pre>",
];

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Quote(&'a str),
    Item(&'a str),
    CodeBlock(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if is_placeholder(trimmed, FENCE_OPEN, FENCE_CLOSE) {
        return Line::CodeBlock(trimmed);
    }

    // Longest prefix first.
    for (level, prefix) in [(3, "### "), (2, "## "), (1, "# ")] {
        if let Some(text) = line.strip_prefix(prefix) {
            return Line::Heading(level, text);
        }
    }

    if let Some(text) = line.strip_prefix("> ") {
        Line::Quote(text)
    } else if let Some(text) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        Line::Item(text)
    } else {
        Line::Text(line)
    }
}

#[derive(Default)]
struct BlockWriter {
    blocks: Vec<String>,
    paragraph: Vec<String>,
    quote: Vec<String>,
    items: Vec<String>,
}

impl BlockWriter {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let html = self.paragraph.join("<br>");
        self.paragraph.clear();

        if BLOCK_TAGS.iter().any(|tag| html.starts_with(tag)) {
            self.blocks.push(html);
        } else {
            self.blocks.push(format!("<p>{html}</p>"));
        }
    }

    fn flush_quote(&mut self) {
        if !self.quote.is_empty() {
            self.blocks.push(format!("<blockquote>{}</blockquote>", self.quote.join("<br>")));
            self.quote.clear();
        }
    }

    fn flush_list(&mut self) {
        if !self.items.is_empty() {
            self.blocks.push(format!("<ul>{}</ul>", self.items.concat()));
            self.items.clear();
        }
    }

    fn flush_all(&mut self) {
        self.flush_paragraph();
        self.flush_quote();
        self.flush_list();
    }

    fn finish(mut self) -> String {
        self.flush_all();
        self.blocks.join("\n\n")
    }
}

pub(super) fn render(text: &str, options: &FormatOptions) -> String {
    let mut writer = BlockWriter::default();

    for line in text.lines() {
        match classify(line) {
            Line::Blank => writer.flush_all(),
            Line::Heading(level, text) => {
                writer.flush_all();
                let html = inline::render(text, options);
                writer.blocks.push(format!("<h{level}>{html}</h{level}>"));
            }
            Line::Quote(text) => {
                writer.flush_paragraph();
                writer.flush_list();
                writer.quote.push(inline::render(text, options));
            }
            Line::Item(text) => {
                writer.flush_paragraph();
                writer.flush_quote();
                writer.items.push(format!("<li>{}</li>", inline::render(text, options)));
            }
            Line::CodeBlock(token) => {
                writer.flush_all();
                writer.blocks.push(token.to_string());
            }
            Line::Text(text) => {
                writer.flush_quote();
                writer.flush_list();
                writer.paragraph.push(inline::render(text, options));
            }
        }
    }

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trusted(text: &str) -> String {
        render(text, &FormatOptions::default())
    }

    #[test]
    fn test_classify_headings() {
        assert_eq!(classify("# a"), Line::Heading(1, "a"));
        assert_eq!(classify("## a"), Line::Heading(2, "a"));
        assert_eq!(classify("### a"), Line::Heading(3, "a"));
        assert_eq!(classify("#### a"), Line::Text("#### a"));
        assert_eq!(classify("#a"), Line::Text("#a"));
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(classify("> q"), Line::Quote("q"));
        assert_eq!(classify("- i"), Line::Item("i"));
        assert_eq!(classify("* i"), Line::Item("i"));
        assert_eq!(classify("*em*"), Line::Text("*em*"));
        assert_eq!(classify("   "), Line::Blank);
        assert_eq!(classify(" \u{E000}3\u{E001} "), Line::CodeBlock("\u{E000}3\u{E001}"));
    }

    #[test]
    fn test_paragraph_line_breaks() {
        assert_eq!(
            trusted("line one\nline two\n\n\n\nsecond"),
            "<p>line one<br>line two</p>\n\n<p>second</p>"
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            trusted("## Sub\n### Third\n#### four"),
            "<h2>Sub</h2>\n\n<h3>Third</h3>\n\n<p>#### four</p>"
        );
    }

    #[test]
    fn test_heading_ends_paragraph() {
        assert_eq!(trusted("intro\n# Title\nbody"), "<p>intro</p>\n\n<h1>Title</h1>\n\n<p>body</p>");
    }

    #[test]
    fn test_quote_lines_are_grouped() {
        assert_eq!(trusted("> one\n> two"), "<blockquote>one<br>two</blockquote>");
    }

    #[test]
    fn test_separate_lists() {
        assert_eq!(
            trusted("- a\n\n- b"),
            "<ul><li>a</li></ul>\n\n<ul><li>b</li></ul>"
        );
    }

    #[test]
    fn test_list_then_text() {
        assert_eq!(
            trusted("- a\n- b\nafter"),
            "<ul><li>a</li><li>b</li></ul>\n\n<p>after</p>"
        );
    }

    #[test]
    fn test_image_paragraph_is_not_wrapped() {
        assert_eq!(trusted("![alt](/a.png)"), "<img src=\"/a.png\" alt=\"alt\">");
    }

    #[test]
    fn test_raw_block_html_is_not_wrapped() {
        assert_eq!(trusted("<p>already</p>"), "<p>already</p>");
        assert_eq!(trusted("<ol><li>x</li></ol>"), "<ol><li>x</li></ol>");
    }

    #[test]
    fn test_code_placeholder_stands_alone() {
        assert_eq!(
            trusted("text\n\u{E000}0\u{E001}\nmore"),
            "<p>text</p>\n\n\u{E000}0\u{E001}\n\n<p>more</p>"
        );
    }
}
