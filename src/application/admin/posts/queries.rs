use crate::cache::{CacheStatus, PostSnapshot};

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// The dashboard always reads through to the store.
    pub async fn list(&self) -> Result<PostSnapshot, AdminPostError> {
        self.cache
            .get_posts(true)
            .await
            .map_err(AdminPostError::from)
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
