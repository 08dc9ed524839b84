//! In-process post store used for local development and tests.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::posts::{Post, sort_newest_first};
use crate::infra::error::InfraError;

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Posts without an id receive one; duplicate slugs are rejected.
    pub fn with_posts(posts: Vec<Post>) -> Result<Self, RepoError> {
        let mut seeded: Vec<Post> = Vec::with_capacity(posts.len());
        for mut post in posts {
            if seeded.iter().any(|existing| existing.slug == post.slug) {
                return Err(RepoError::duplicate_slug());
            }
            post.id.get_or_insert_with(new_id);
            seeded.push(post);
        }
        Ok(Self {
            posts: RwLock::new(seeded),
        })
    }

    /// Load a JSON array of posts from disk.
    pub async fn from_seed_file(path: &Path) -> Result<Self, InfraError> {
        let raw = tokio::fs::read(path).await?;
        let posts: Vec<Post> = serde_json::from_slice(&raw).map_err(|err| {
            InfraError::store(format!("invalid seed file `{}`: {err}", path.display()))
        })?;
        Self::with_posts(posts).map_err(|err| {
            InfraError::store(format!("invalid seed file `{}`: {err}", path.display()))
        })
    }
}

#[async_trait]
impl PostsRepo for InMemoryPostStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.posts.read().await.clone();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let guard = self.posts.read().await;
        Ok(guard.iter().find(|post| post.slug == slug).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryPostStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        let mut guard = self.posts.write().await;
        if guard.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::duplicate_slug());
        }

        let post = params.into_post(Some(new_id()));
        guard.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<Post, RepoError> {
        let mut guard = self.posts.write().await;
        if guard
            .iter()
            .any(|post| post.slug == params.slug && post.id.as_deref() != Some(params.id.as_str()))
        {
            return Err(RepoError::duplicate_slug());
        }

        let slot = guard
            .iter_mut()
            .find(|post| post.id.as_deref() == Some(params.id.as_str()))
            .ok_or(RepoError::NotFound)?;
        *slot = params.into_post();
        Ok(slot.clone())
    }

    async fn delete_post(&self, id: &str) -> Result<(), RepoError> {
        let mut guard = self.posts.write().await;
        let before = guard.len();
        guard.retain(|post| post.id.as_deref() != Some(id));
        if guard.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
