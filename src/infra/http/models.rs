use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::admin::posts::{CreatePostCommand, UpdatePostCommand};
use crate::cache::CacheStatus;
use crate::domain::posts::Post;

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse<'a> {
    pub posts: &'a [Post],
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStatus,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreateRequest {
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_hint: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdateRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_hint: String,
}

#[derive(Debug, Serialize)]
pub struct CacheInvalidateResponse {
    pub invalidated: bool,
    pub cache: CacheStatus,
}

impl From<PostCreateRequest> for CreatePostCommand {
    fn from(request: PostCreateRequest) -> Self {
        Self {
            slug: request.slug,
            title: request.title,
            excerpt: request.excerpt,
            author: request.author,
            content: request.content,
            date: request.date,
            image_url: request.image_url,
            image_hint: request.image_hint,
        }
    }
}

impl PostUpdateRequest {
    pub fn into_command(self, id: String) -> UpdatePostCommand {
        UpdatePostCommand {
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
