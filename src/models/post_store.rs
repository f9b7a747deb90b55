use crate::models::Post;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Post source not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid post JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to walk post directory: {0}")]
    Walk(#[from] walkdir::Error),
}

// The API returns a list for `/blogs` and a single object for `/blogs/{slug}`;
// dumps of either shape are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostFile {
    Many(Vec<Post>),
    One(Post),
}

/// Loads posts from a JSON file, or from every `*.json` file under a directory.
/// Later posts reusing an earlier slug are skipped.
pub fn load_posts(path: &Path) -> Result<Vec<Post>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }

    let mut posts = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if entry.file_type().is_file() && is_json {
                posts.extend(read_post_file(entry.path())?);
            }
        }
    } else {
        posts = read_post_file(path)?;
    }

    let posts = dedupe_by_slug(posts);
    log::info!("Loaded {} post(s) from '{}'", posts.len(), path.display());
    Ok(posts)
}

fn read_post_file(path: &Path) -> Result<Vec<Post>, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: PostFile = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match parsed {
        PostFile::Many(posts) => posts,
        PostFile::One(post) => vec![post],
    })
}

fn dedupe_by_slug(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| {
            let first = seen.insert(post.slug.clone());
            if !first {
                log::warn!("Skipping duplicate post slug '{}'", post.slug);
            }
            first
        })
        .collect()
}

/// Newest first; posts with unreadable dates go last.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_cached_key(|post| Reverse(post.created_at_utc()));
}

pub fn find_by_slug<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    posts.iter().find(|post| post.slug == slug)
}
