use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formatter::Formatter;
use crate::helper::text_helpers::{self, DateStyle, LinkStyle};

pub mod post_store;

/// A post record as returned by the blog API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Kept as the API sends it; parsed on display.
    pub created_at: String,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub views: Option<u64>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),
    #[error("Invalid slug '{0}': use lowercase letters, numbers and single hyphens")]
    InvalidSlug(String),
}

impl Post {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        text_helpers::parse_timestamp(&self.created_at)
    }

    /// All of title, slug and content are required, and the slug must be URL-safe.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [("title", &self.title), ("slug", &self.slug), ("content", &self.content)] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }
        if !text_helpers::is_valid_slug(&self.slug) {
            return Err(ValidationError::InvalidSlug(self.slug.clone()));
        }
        Ok(())
    }
}

/// A post as shown on the listing page.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub title: String,
    pub slug: String,
    /// Truncated raw body. Escaped by the template, not rendered as markdown.
    pub excerpt: String,
    pub date: String,
    pub link: String,
    pub likes: u64,
    pub views: u64,
}

impl PostCard {
    pub fn from_post(post: &Post, excerpt_length: usize, link_style: LinkStyle) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: text_helpers::truncate_content(&post.content, excerpt_length),
            date: text_helpers::format_date(&post.created_at, DateStyle::Short),
            link: text_helpers::post_link(&post.slug, link_style),
            likes: post.likes.unwrap_or(0),
            views: post.views.unwrap_or(0),
        }
    }
}

/// A post as shown on its own page, body already converted to HTML.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub content_html: String,
    pub likes: u64,
    pub views: u64,
}

impl RenderedPost {
    pub fn from_post(post: &Post, formatter: &Formatter) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            date: text_helpers::format_date(&post.created_at, DateStyle::Long),
            content_html: formatter.format(&post.content),
            likes: post.likes.unwrap_or(0),
            views: post.views.unwrap_or(0),
        }
    }
}
