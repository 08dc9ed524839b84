use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::repos::{CreatePostParams, UpdatePostParams};
use crate::domain::error::DomainError;
use crate::domain::posts::Post;
use crate::domain::slug::{SlugAsyncError, generate_unique_slug_async};

use super::service::AdminPostService;
use super::types::{
    AdminPostError, AdminWriteOutcome, CreatePostCommand, UpdatePostCommand, ensure_non_empty,
};

impl AdminPostService {
    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<AdminWriteOutcome, AdminPostError> {
        ensure_non_empty(&command.title, "title")?;

        let slug = match command.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => self.unique_slug_for(&command.title).await?,
        };

        let params = CreatePostParams {
            slug,
            title: command.title,
            excerpt: command.excerpt,
            author: command.author,
            content: command.content,
            date: command.date.unwrap_or_else(OffsetDateTime::now_utc),
            image_url: command.image_url,
            image_hint: command.image_hint,
        };
        params.clone().into_post(None).validate()?;

        let post = self.writer.create_post(params).await?;
        info!(
            target = "studio_blog::admin::posts",
            slug = %post.slug,
            id = post.id.as_deref().unwrap_or_default(),
            "post created"
        );

        Ok(self.after_write(Some(post)).await)
    }

    pub async fn update_post(
        &self,
        command: UpdatePostCommand,
    ) -> Result<AdminWriteOutcome, AdminPostError> {
        ensure_non_empty(&command.id, "id")?;
        ensure_non_empty(&command.slug, "slug")?;
        ensure_non_empty(&command.title, "title")?;

        let params = UpdatePostParams {
            id: command.id,
            slug: command.slug,
            title: command.title,
            excerpt: command.excerpt,
            author: command.author,
            content: command.content,
            date: command.date,
            image_url: command.image_url,
            image_hint: command.image_hint,
        };
        params.clone().into_post().validate()?;

        let post = self.writer.update_post(params).await?;
        info!(
            target = "studio_blog::admin::posts",
            slug = %post.slug,
            id = post.id.as_deref().unwrap_or_default(),
            "post updated"
        );

        Ok(self.after_write(Some(post)).await)
    }

    pub async fn delete_post(&self, id: &str) -> Result<AdminWriteOutcome, AdminPostError> {
        ensure_non_empty(id, "id")?;

        self.writer.delete_post(id).await?;
        info!(target = "studio_blog::admin::posts", id, "post deleted");

        Ok(self.after_write(None).await)
    }

    async fn unique_slug_for(&self, title: &str) -> Result<String, AdminPostError> {
        let cache = Arc::clone(&self.cache);
        let result = generate_unique_slug_async(title, move |candidate| {
            let cache = Arc::clone(&cache);
            let candidate = candidate.to_string();
            async move {
                cache
                    .get_post_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await;

        match result {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(err)) => Err(DomainError::from(err).into()),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminPostError::Fetch(err)),
        }
    }

    /// Drop the snapshot, then read the list back from the store.
    async fn after_write(&self, post: Option<Post>) -> AdminWriteOutcome {
        self.cache.invalidate();
        let posts = match self.cache.get_posts(true).await {
            Ok(posts) => Some(posts),
            Err(err) => {
                warn!(
                    target = "studio_blog::admin::posts",
                    error = %err,
                    "write succeeded but the post list could not be refreshed"
                );
                None
            }
        };
        AdminWriteOutcome { post, posts }
    }
}
