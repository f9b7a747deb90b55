//! Markdown-to-HTML formatting for post bodies.
//!
//! Supports a constrained markdown subset: `#`–`###` headings, bold and italic,
//! images, links, fenced and inline code, blockquotes, unordered lists and
//! paragraphs separated by blank lines.
//!
//! Rendering runs in a fixed order:
//!
//! 1. fenced code blocks are cut out and replaced by placeholder tokens,
//! 2. a line scanner decides block structure and renders inline rules per line,
//! 3. placeholders are swapped back for the rendered `<pre><code>` markup.
//!
//! What happens to raw HTML outside code regions is decided by [`EscapePolicy`].

mod block;
mod fence;
mod inline;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helper::sanitization_helpers;

pub use fence::normalize_language;

// Private-use sentinels around a decimal index. Stripped from input up front.
const FENCE_OPEN: char = '\u{E000}';
const FENCE_CLOSE: char = '\u{E001}';
const INLINE_OPEN: char = '\u{E002}';
const INLINE_CLOSE: char = '\u{E003}';

/// How text outside code regions is treated.
///
/// Escaping inside fenced and inline code always happens regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapePolicy {
    /// Raw HTML in the post body passes through untouched.
    ///
    /// Only appropriate when every post is written by a trusted author: a
    /// literal `<script>` in the body ends up in the page.
    #[default]
    Trusted,
    /// `&`, `<`, `>` and `"` outside code are escaped before markdown rules run.
    Escape,
    /// Raw HTML is kept but the rendered output goes through an allow-list sanitizer.
    Sanitize,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown escape policy '{0}' (expected trusted, escape or sanitize)")]
pub struct UnknownPolicy(pub String);

impl FromStr for EscapePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" => Ok(Self::Trusted),
            "escape" => Ok(Self::Escape),
            "sanitize" => Ok(Self::Sanitize),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for EscapePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trusted => "trusted",
            Self::Escape => "escape",
            Self::Sanitize => "sanitize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub escape: EscapePolicy,
    /// Adds `target="_blank"` to rendered links.
    pub links_in_new_tab: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            escape: EscapePolicy::default(),
            links_in_new_tab: true,
        }
    }
}

/// Renders post bodies to HTML. Holds only options, so one instance can be
/// shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn with_policy(escape: EscapePolicy) -> Self {
        Self::new(FormatOptions {
            escape,
            ..FormatOptions::default()
        })
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Converts a markdown post body to HTML.
    ///
    /// Never fails: malformed markdown comes out as literal text. Feeding the
    /// output back in is not supported and may corrupt the markup.
    pub fn format(&self, content: &str) -> String {
        let source = normalize_input(content);
        if source.trim().is_empty() {
            return String::new();
        }

        let mut code_blocks = Vec::new();
        let text = fence::extract(&source, &mut code_blocks);
        log::debug!("Extracted {} fenced code block(s)", code_blocks.len());

        let body = block::render(&text, &self.options);
        let html = resolve_placeholders(&body, FENCE_OPEN, FENCE_CLOSE, &code_blocks);

        match self.options.escape {
            EscapePolicy::Sanitize => sanitization_helpers::sanitize_html(&html),
            EscapePolicy::Trusted | EscapePolicy::Escape => html,
        }
    }
}

/// Formats with the default options ([`EscapePolicy::Trusted`], links in a new tab).
pub fn format(content: &str) -> String {
    Formatter::default().format(content)
}

fn normalize_input(content: &str) -> String {
    content
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| !matches!(*c, FENCE_OPEN | FENCE_CLOSE | INLINE_OPEN | INLINE_CLOSE))
        .collect()
}

fn placeholder(open: char, close: char, index: usize) -> String {
    format!("{open}{index}{close}")
}

fn is_placeholder(text: &str, open: char, close: char) -> bool {
    text.strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Swaps every `open<n>close` token for `table[n]`. Tokens with no entry are dropped.
fn resolve_placeholders(text: &str, open: char, close: char, table: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        let after = &rest[start + open.len_utf8()..];
        let Some(end) = after.find(close) else {
            rest = &rest[start..];
            break;
        };

        let token = &after[..end];
        match token.parse::<usize>().ok().and_then(|i| table.get(i)) {
            Some(html) => out.push_str(html),
            None => log::warn!("Dropping unresolved placeholder '{}'", token),
        }
        rest = &after[end + close.len_utf8()..];
    }

    out.push_str(rest);
    out
}
