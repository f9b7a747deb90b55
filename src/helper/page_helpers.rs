use crate::formatter::Formatter;
use crate::helper::text_helpers::LinkStyle;
use crate::models::{Post, PostCard, RenderedPost};
use tera::{Context, Tera};
use thiserror::Error;

const BASE_TEMPLATE: &str = include_str!("../../templates/base.html");
const LISTING_TEMPLATE: &str = include_str!("../../templates/listing.html");
const POST_TEMPLATE: &str = include_str!("../../templates/post.html");
const ERROR_TEMPLATE: &str = include_str!("../../templates/error.html");

#[derive(Error, Debug)]
pub enum PageError {
    #[error("No post specified in URL. Please check the link.")]
    MissingSlug,
    #[error("Post not found. The post may have been deleted or the URL is incorrect.")]
    NotFound(String),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

/// Values every page needs besides its own data.
#[derive(Debug, Clone)]
pub struct PageSettings<'a> {
    pub site_title: &'a str,
    pub excerpt_length: usize,
    pub link_style: LinkStyle,
    /// URL prefix of the stylesheet directory, without trailing slash.
    pub static_prefix: &'a str,
    pub home_link: &'a str,
}

/// Builds a Tera instance with the page templates compiled in.
pub fn build_tera() -> Result<Tera, PageError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("listing.html", LISTING_TEMPLATE),
        ("post.html", POST_TEMPLATE),
        ("error.html", ERROR_TEMPLATE),
    ])?;
    Ok(tera)
}

fn base_context(settings: &PageSettings) -> Context {
    let mut ctx = Context::new();
    ctx.insert("site_title", settings.site_title);
    ctx.insert("static_prefix", settings.static_prefix);
    ctx.insert("home_link", settings.home_link);
    ctx
}

/// Renders the listing page. `posts` are shown in the order given.
pub fn render_listing(tera: &Tera, posts: &[Post], settings: &PageSettings) -> Result<String, PageError> {
    let cards: Vec<PostCard> = posts
        .iter()
        .map(|post| PostCard::from_post(post, settings.excerpt_length, settings.link_style))
        .collect();

    let mut ctx = base_context(settings);
    ctx.insert("cards", &cards);
    Ok(tera.render("listing.html", &ctx)?)
}

pub fn render_post(
    tera: &Tera,
    post: &Post,
    formatter: &Formatter,
    settings: &PageSettings,
) -> Result<String, PageError> {
    let mut ctx = base_context(settings);
    ctx.insert("post", &RenderedPost::from_post(post, formatter));
    Ok(tera.render("post.html", &ctx)?)
}

pub fn render_error(tera: &Tera, message: &str, settings: &PageSettings) -> Result<String, PageError> {
    let mut ctx = base_context(settings);
    ctx.insert("message", message);
    Ok(tera.render("error.html", &ctx)?)
}

/// Picks the post a `?slug=` request refers to.
pub fn resolve_post<'a>(posts: &'a [Post], slug: Option<&str>) -> Result<&'a Post, PageError> {
    let slug = match slug.map(str::trim) {
        Some(slug) if !slug.is_empty() => slug,
        _ => return Err(PageError::MissingSlug),
    };

    crate::models::post_store::find_by_slug(posts, slug).ok_or_else(|| PageError::NotFound(slug.to_string()))
}
