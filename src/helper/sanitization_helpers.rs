// Escaping and sanitizing used by the formatter's escape policies.

/// Escapes text that must show up literally inside `<code>`: `& < > " '`.
pub fn escape_code(code: &str) -> String {
    html_escape::encode_quoted_attribute(code).into_owned()
}

/// Escapes raw markup in post text outside code regions.
/// Existing entities are decoded first so they are not escaped twice.
pub fn escape_markup(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    html_escape::encode_double_quoted_attribute(&decoded).into_owned()
}

/// Cleans rendered post HTML against an allow-list.
/// Scripts, event handlers and unknown tags are removed; the markup the
/// formatter itself produces (code language classes, link targets) survives.
pub fn sanitize_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("code", &["class"])
        .add_tag_attributes("a", &["target"])
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_code() {
        assert_eq!(escape_code("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; &quot;d&quot;");
        assert!(!escape_code("it's").contains('\''));
    }

    #[test]
    fn test_escape_markup_does_not_double_escape() {
        assert_eq!(escape_markup("AT&amp;T <b>"), "AT&amp;T &lt;b&gt;");
        assert_eq!(escape_markup("&lt;script&gt;"), "&lt;script&gt;");
    }

    #[test]
    fn test_sanitize_html_strips_handlers() {
        let clean = sanitize_html("<p onclick=\"steal()\">hi</p><img src=\"/a.png\" onerror=\"x()\">");
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("onerror"));
        assert!(clean.contains("<p>hi</p>"));
    }

    #[test]
    fn test_sanitize_html_keeps_formatter_markup() {
        let clean = sanitize_html(
            "<pre><code class=\"language-go\">x</code></pre><a href=\"https://e.com\" target=\"_blank\">e</a>",
        );
        assert!(clean.contains("<code class=\"language-go\">x</code>"));
        assert!(clean.contains("target=\"_blank\""));
    }
}
