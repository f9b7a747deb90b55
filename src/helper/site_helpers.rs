use crate::config::Config;
use crate::formatter::Formatter;
use crate::helper::page_helpers::{self, PageError, PageSettings};
use crate::helper::text_helpers::{self, LinkStyle};
use crate::models::post_store;
use crate::models::{Post, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("Failed to walk static assets: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Listing page plus one page per post.
    pub pages_written: usize,
    pub assets_copied: usize,
    /// Slugs of posts left out because they failed validation.
    pub skipped: Vec<String>,
}

/// Renders the listing and every valid post into `config.output_path`:
///
/// ```text
/// index.html
/// posts/<slug>.html
/// static/...        (copied from config.static_path when it exists)
/// ```
pub fn build_site(config: &Config, posts: &[Post]) -> Result<BuildReport, BuildError> {
    let mut report = BuildReport::default();

    let mut publishable: Vec<Post> = Vec::with_capacity(posts.len());
    for post in posts {
        match post.validate() {
            Ok(()) => publishable.push(post.clone()),
            Err(ValidationError::InvalidSlug(slug)) => {
                log::warn!(
                    "Skipping post '{}': invalid slug, try '{}'",
                    slug,
                    text_helpers::slugify(&post.title)
                );
                report.skipped.push(post.slug.clone());
            }
            Err(e) => {
                log::warn!("Skipping post '{}': {}", post.slug, e);
                report.skipped.push(post.slug.clone());
            }
        }
    }
    post_store::sort_newest_first(&mut publishable);

    let out = &config.output_path;
    let posts_dir = out.join("posts");
    create_dir(&posts_dir)?;

    let tera = page_helpers::build_tera()?;
    let formatter = Formatter::with_policy(config.escape_policy);

    let index_settings = PageSettings {
        site_title: &config.site_title,
        excerpt_length: config.excerpt_length,
        link_style: LinkStyle::Static,
        static_prefix: "static",
        home_link: "index.html",
    };
    let index = page_helpers::render_listing(&tera, &publishable, &index_settings)?;
    write_file(&out.join("index.html"), &index)?;
    report.pages_written += 1;

    let post_settings = PageSettings {
        static_prefix: "../static",
        home_link: "../index.html",
        ..index_settings
    };
    for post in &publishable {
        let html = page_helpers::render_post(&tera, post, &formatter, &post_settings)?;
        write_file(&posts_dir.join(format!("{}.html", post.slug)), &html)?;
        report.pages_written += 1;
    }

    if config.static_path.is_dir() {
        report.assets_copied = copy_assets(&config.static_path, &out.join("static"))?;
    } else {
        log::debug!("No static directory at '{}'", config.static_path.display());
    }

    log::info!(
        "Built {} page(s) and copied {} asset(s) into '{}'",
        report.pages_written,
        report.assets_copied,
        out.display()
    );
    Ok(report)
}

fn copy_assets(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };

        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            create_dir(parent)?;
        }
        fs::copy(entry.path(), &target).map_err(|source| BuildError::Io {
            path: target.clone(),
            source,
        })?;
        copied += 1;
    }
    Ok(copied)
}

fn create_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}
