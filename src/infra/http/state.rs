use std::sync::Arc;

use crate::application::admin::posts::AdminPostService;
use crate::application::blog::BlogService;
use crate::cache::PostCache;

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub admin: Arc<AdminPostService>,
    pub cache: Arc<PostCache>,
    /// Admin routes are only mounted when this is set.
    pub admin_password: Option<Arc<str>>,
}

impl HttpState {
    pub fn new(
        cache: Arc<PostCache>,
        admin: Arc<AdminPostService>,
        admin_password: Option<String>,
    ) -> Self {
        Self {
            blog: Arc::new(BlogService::new(Arc::clone(&cache))),
            admin,
            cache,
            admin_password: admin_password.map(Arc::from),
        }
    }
}
