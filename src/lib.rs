use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tera::Tera;

use crate::models::{post_store, Post};

pub mod config;
pub mod formatter;
pub mod helper;
pub mod models;
pub mod routes;

pub use formatter::{format, EscapePolicy, FormatOptions, Formatter};

/// Shared across actix workers by the preview server.
pub struct AppState {
    pub posts: Arc<RwLock<Vec<Post>>>,
    pub formatter: Formatter,
    pub tera: Tera,
}

impl AppState {
    pub fn new(mut posts: Vec<Post>, formatter: Formatter, tera: Tera) -> Self {
        post_store::sort_newest_first(&mut posts);
        Self {
            posts: Arc::new(RwLock::new(posts)),
            formatter,
            tera,
        }
    }

    pub fn posts(&self) -> RwLockReadGuard<'_, Vec<Post>> {
        self.posts.read().unwrap_or_else(|poisoned| {
            log::error!("Post list lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn posts_mut(&self) -> RwLockWriteGuard<'_, Vec<Post>> {
        self.posts.write().unwrap_or_else(|poisoned| {
            log::error!("Post list lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Swaps in a freshly loaded post list and returns its length.
    pub fn replace_posts(&self, mut posts: Vec<Post>) -> usize {
        post_store::sort_newest_first(&mut posts);
        let count = posts.len();
        *self.posts_mut() = posts;
        count
    }
}
