//! Fenced code block extraction.

use super::{placeholder, FENCE_CLOSE, FENCE_OPEN};
use crate::helper::sanitization_helpers::escape_code;

const FENCE: &str = "```";

/// Recognized language tokens and the class name each one renders as.
const LANGUAGES: &[(&str, &str)] = &[
    ("go", "go"),
    ("golang", "go"),
    ("java", "java"),
    ("js", "javascript"),
    ("javascript", "javascript"),
    ("ts", "typescript"),
    ("typescript", "typescript"),
    ("json", "json"),
    ("bash", "bash"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("py", "python"),
    ("python", "python"),
    ("c", "c"),
    ("cpp", "cpp"),
    ("c++", "cpp"),
    ("rust", "rust"),
    ("rs", "rust"),
    ("html", "html"),
    ("css", "css"),
    ("xml", "xml"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("dockerfile", "dockerfile"),
    ("sql", "sql"),
];

/// Maps a language token (case-insensitive) to its canonical name.
///
/// ```
/// use blog_renderer::formatter::normalize_language;
///
/// assert_eq!(normalize_language("golang"), Some("go"));
/// assert_eq!(normalize_language(" PY "), Some("python"));
/// assert_eq!(normalize_language("hello"), None);
/// ```
pub fn normalize_language(token: &str) -> Option<&'static str> {
    let token = token.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map(|(_, canonical)| *canonical)
}

/// Replaces every closed fence in `source` with a placeholder token and pushes
/// the rendered block onto `blocks`. An opening fence with no closing fence is
/// left in the text.
pub(super) fn extract(source: &str, blocks: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find(FENCE) {
        let after_open = &rest[start + FENCE.len()..];
        let Some(end) = after_open.find(FENCE) else {
            break;
        };

        out.push_str(&rest[..start]);
        blocks.push(render_block(&after_open[..end]));
        out.push_str(&placeholder(FENCE_OPEN, FENCE_CLOSE, blocks.len() - 1));
        rest = &after_open[end + FENCE.len()..];
    }

    out.push_str(rest);
    out
}

fn render_block(inner: &str) -> String {
    let (language, body) = split_language(inner);
    let body = body.strip_suffix('\n').unwrap_or(body);
    let code = escape_code(body);

    match language {
        Some(language) => format!("<pre><code class=\"language-{language}\">{code}</code></pre>"),
        None => format!("<pre><code>{code}</code></pre>"),
    }
}

/// Splits the text between two fences into an optional language and the code body.
fn split_language(inner: &str) -> (Option<String>, &str) {
    let Some((opening, rest)) = inner.split_once('\n') else {
        return (None, inner);
    };

    let tag = opening.trim();
    if tag.is_empty() {
        // No tag after the backticks: the first code line may name the language.
        let (first, body) = rest.split_once('\n').unwrap_or((rest, ""));
        return match normalize_language(first) {
            Some(language) => (Some(language.to_string()), body),
            None => (None, rest),
        };
    }

    if is_language_tag(tag) {
        let language = normalize_language(tag)
            .map(str::to_string)
            .unwrap_or_else(|| tag.to_ascii_lowercase());
        (Some(language), rest)
    } else {
        (None, inner)
    }
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '#' | '.'))
}
