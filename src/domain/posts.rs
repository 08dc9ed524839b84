//! Blog post entity as held by the post cache and the stores behind it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;
use super::slug::is_valid_slug;

/// One blog article.
///
/// `id` is assigned by the document store on creation and is `None` for
/// records that have not been persisted yet. `content` carries pre-formatted
/// markup and is never inspected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
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

impl Post {
    /// Check the fields a store requires before persisting this post.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::validation(
                "slug",
                format!("`{}` is not a URL-safe slug", self.slug),
            ));
        }
        Ok(())
    }
}

/// Newest first.
pub fn by_date_desc(a: &Post, b: &Post) -> Ordering {
    b.date.cmp(&a.date)
}

/// Stable sort into snapshot order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(by_date_desc);
}
