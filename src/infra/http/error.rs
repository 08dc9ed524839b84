use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::posts::AdminPostError;
use crate::application::error::{AppError, ErrorReport};
use crate::application::repos::RepoError;
use crate::cache::FetchError;
use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const STORE_TIMEOUT: &str = "store_timeout";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
    pub const REPO: &str = "repo_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Admin credentials required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::INTEGRITY,
            "Stored post is malformed",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::GATEWAY_TIMEOUT,
            codes::STORE_TIMEOUT,
            "Document store timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

/// Reads that go through the cache surface upstream failures as 503 unless
/// the store reported something more specific.
pub(crate) fn fetch_to_api(err: FetchError) -> ApiError {
    match err.repo_error() {
        RepoError::Timeout => ApiError::new(
            StatusCode::GATEWAY_TIMEOUT,
            codes::STORE_TIMEOUT,
            "Document store timeout",
            None,
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::INTEGRITY,
            "Stored post is malformed",
            Some(message.clone()),
        ),
        other => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORE_UNAVAILABLE,
            "Post store temporarily unavailable",
            Some(other.to_string()),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::PostNotFound { .. } => ApiError::not_found("post not found"),
        DomainError::Validation { field, message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid post",
            Some(format!("{field}: {message}")),
        ),
        DomainError::Slug(err @ SlugError::Exhausted { .. }) => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "No free slug left for this title",
            Some(err.to_string()),
        ),
        DomainError::Slug(err) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Title does not yield a slug",
            Some(err.to_string()),
        ),
    }
}

pub(crate) fn app_to_api(err: AppError) -> ApiError {
    match err {
        AppError::Domain(domain) => domain_to_api(domain),
        AppError::Fetch(fetch) => fetch_to_api(fetch),
        AppError::Infra(_) | AppError::Unexpected(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Unexpected error occurred",
            Some(err.to_string()),
        ),
    }
}

pub(crate) fn post_to_api(err: AdminPostError) -> ApiError {
    match err {
        AdminPostError::ConstraintViolation(field) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid post",
            Some(field.to_string()),
        ),
        AdminPostError::Domain(domain) => domain_to_api(domain),
        AdminPostError::Repo(repo) => repo_to_api(repo),
        AdminPostError::Fetch(fetch) => fetch_to_api(fetch),
    }
}
