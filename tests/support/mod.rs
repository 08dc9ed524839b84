//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use studio_blog::application::repos::{PostsRepo, RepoError};
use studio_blog::domain::posts::Post;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn post(slug: &str, date: &str) -> Post {
    let date = if date.len() == 10 {
        format!("{date}T00:00:00Z")
    } else {
        date.to_string()
    };
    Post {
        id: Some(format!("id-{slug}")),
        slug: slug.to_string(),
        title: format!("Post {slug}"),
        excerpt: format!("About {slug}"),
        author: "Studio".to_string(),
        content: format!("<p>{slug}</p>"),
        date: OffsetDateTime::parse(&date, &Rfc3339).expect("fixture date"),
        image_url: String::new(),
        image_hint: String::new(),
    }
}

pub fn slugs(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|post| post.slug.as_str()).collect()
}

/// Upstream double that counts calls and can be told to fail or stall.
#[derive(Default)]
pub struct ScriptedStore {
    posts: Mutex<Vec<Post>>,
    list_calls: AtomicUsize,
    slug_calls: AtomicUsize,
    failing: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedStore {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
            ..Self::default()
        }
    }

    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.posts.lock().expect("posts lock") = posts;
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn stall(&self, latency: Duration) {
        *self.latency.lock().expect("latency lock") = Some(latency);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn slug_calls(&self) -> usize {
        self.slug_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().expect("latency lock");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepoError::from_persistence("upstream unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PostsRepo for ScriptedStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.check()?;
        Ok(self.posts.lock().expect("posts lock").clone())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.slug_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.check()?;
        Ok(self
            .posts
            .lock()
            .expect("posts lock")
            .iter()
            .find(|post| post.slug == slug)
            .cloned())
    }
}
