//! Document-store adapters behind the post cache.

pub mod firestore;
pub mod memory;

use std::sync::Arc;

use tracing::info;

use crate::application::repos::{PostsRepo, PostsWriteRepo};
use crate::config::StoreSettings;

use super::error::InfraError;

pub use firestore::FirestorePostStore;
pub use memory::InMemoryPostStore;

/// Read and write handles onto the same backing store.
#[derive(Clone)]
pub struct PostStores {
    pub reader: Arc<dyn PostsRepo>,
    pub writer: Arc<dyn PostsWriteRepo>,
}

impl PostStores {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PostsRepo + PostsWriteRepo + 'static,
    {
        Self {
            reader: store.clone(),
            writer: store,
        }
    }
}

/// Build the configured store backend.
pub async fn connect(settings: &StoreSettings) -> Result<PostStores, InfraError> {
    match settings {
        StoreSettings::Memory { seed_file } => {
            let store = match seed_file {
                Some(path) => InMemoryPostStore::from_seed_file(path).await?,
                None => InMemoryPostStore::new(),
            };
            info!(
                target = "studio_blog::store",
                backend = "memory",
                seeded = seed_file.is_some(),
                "post store ready"
            );
            Ok(PostStores::from_store(Arc::new(store)))
        }
        StoreSettings::Firestore(firestore) => {
            let store = FirestorePostStore::new(firestore)?;
            info!(
                target = "studio_blog::store",
                backend = "firestore",
                project = %firestore.project_id,
                collection = %firestore.collection,
                "post store ready"
            );
            Ok(PostStores::from_store(Arc::new(store)))
        }
    }
}
