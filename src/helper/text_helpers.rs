use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use url::form_urlencoded;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("slug filter pattern"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("hyphen pattern"));
static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `Jan 5, 2025`, used on listing cards.
    Short,
    /// `January 5, 2025 at 03:04 PM`, used on the post page.
    Long,
}

/// Where post links point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `/post?slug=...`, served by the preview server.
    Query,
    /// `posts/<slug>.html`, relative to the static site root.
    Static,
}

/// Keeps the first `max_length` characters and appends `...` when anything was cut.
pub fn truncate_content(content: &str, max_length: usize) -> String {
    match content.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Parses the timestamp shapes the blog API has been seen to return.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats a post timestamp in UTC. Values that cannot be parsed are shown as-is.
pub fn format_date(raw: &str, style: DateStyle) -> String {
    let Some(date) = parse_timestamp(raw) else {
        log::debug!("Unparseable post date '{}'", raw);
        return raw.to_string();
    };

    match style {
        DateStyle::Short => date.format("%b %-d, %Y").to_string(),
        DateStyle::Long => date.format("%B %-d, %Y at %I:%M %p").to_string(),
    }
}

/// Derives a URL slug from a post title.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lower, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&cleaned, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Lowercase letters and digits in groups joined by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    VALID_SLUG.is_match(slug)
}

pub fn post_link(slug: &str, style: LinkStyle) -> String {
    match style {
        LinkStyle::Query => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("slug", slug)
                .finish();
            format!("/post?{}", query)
        }
        LinkStyle::Static => format!("posts/{}.html", slug),
    }
}
