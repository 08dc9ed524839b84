use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::cache::{FetchError, PostSnapshot};
use crate::domain::{error::DomainError, posts::Post};

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("`{0}` must not be empty")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub content: String,
    /// Defaults to now.
    pub date: Option<OffsetDateTime>,
    pub image_url: String,
    pub image_hint: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
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

/// Result of an admin write.
///
/// `posts` is the refreshed list, or `None` when the write landed but the
/// follow-up read failed. The cache is empty in that case, so the next read
/// goes upstream.
#[derive(Debug, Clone, Serialize)]
pub struct AdminWriteOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Post>,
    pub posts: Option<PostSnapshot>,
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), AdminPostError> {
    if value.trim().is_empty() {
        return Err(AdminPostError::ConstraintViolation(field));
    }
    Ok(())
}
