use thiserror::Error;

use super::slug::SlugError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post `{slug}` not found")]
    PostNotFound { slug: String },
    #[error("post validation failed on `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Slug(#[from] SlugError),
}

impl DomainError {
    pub fn post_not_found(slug: impl Into<String>) -> Self {
        Self::PostNotFound { slug: slug.into() }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
