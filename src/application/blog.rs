//! Public blog reads. Always TTL-respecting.

use std::sync::Arc;

use crate::cache::{PostCache, PostSnapshot};
use crate::domain::{error::DomainError, posts::Post};

use super::error::AppError;

#[derive(Clone)]
pub struct BlogService {
    cache: Arc<PostCache>,
}

impl BlogService {
    pub fn new(cache: Arc<PostCache>) -> Self {
        Self { cache }
    }

    pub async fn list_posts(&self) -> Result<PostSnapshot, AppError> {
        Ok(self.cache.get_posts(false).await?)
    }

    /// Newest `limit` posts, e.g. for a homepage teaser.
    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>, AppError> {
        let posts = self.list_posts().await?;
        Ok(posts.iter().take(limit).cloned().collect())
    }

    pub async fn post_by_slug(&self, slug: &str) -> Result<Post, AppError> {
        self.cache
            .get_post_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::post_not_found(slug).into())
    }
}
