//! Repository traits describing the document-store adapters behind the blog.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::posts::Post;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("store request timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    pub fn duplicate_slug() -> Self {
        Self::Duplicate {
            constraint: "posts.slug".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub image_url: String,
    pub image_hint: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub content: String,
    pub date: OffsetDateTime,
    pub image_url: String,
    pub image_hint: String,
}

impl CreatePostParams {
    pub fn into_post(self, id: Option<String>) -> Post {
        Post {
            id,
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            author: self.author,
            content: self.content,
            date: self.date,
            image_url: self.image_url,
            image_hint: self.image_hint,
        }
    }
}

impl UpdatePostParams {
    pub fn into_post(self) -> Post {
        Post {
            id: Some(self.id),
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            author: self.author,
            content: self.content,
            date: self.date,
            image_url: self.image_url,
            image_hint: self.image_hint,
        }
    }
}

/// Read side of the upstream document store.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every post, ordered by `date` descending.
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError>;

    /// Point lookup by slug. `Ok(None)` when no post carries it.
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;
}

/// Write side of the upstream document store.
#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<Post, RepoError>;

    async fn delete_post(&self, id: &str) -> Result<(), RepoError>;
}
