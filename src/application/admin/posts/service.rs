use std::sync::Arc;

use crate::application::repos::PostsWriteRepo;
use crate::cache::PostCache;

/// Admin CRUD over posts. Every successful write drops the cache and then
/// re-reads the list so the dashboard sees the mutation immediately.
#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
    pub(crate) cache: Arc<PostCache>,
}

impl AdminPostService {
    pub fn new(writer: Arc<dyn PostsWriteRepo>, cache: Arc<PostCache>) -> Self {
        Self { writer, cache }
    }
}
