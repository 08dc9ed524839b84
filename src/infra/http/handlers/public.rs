use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::infra::http::error::{ApiError, app_to_api};
use crate::infra::http::models::{HealthResponse, PostListQuery, PostListResponse};
use crate::infra::http::state::HttpState;

/// Liveness plus the cache lifecycle state. Never touches the store.
pub async fn health(State(state): State<HttpState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.status(),
    })
}

pub async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<PostListQuery>,
) -> Result<Response, ApiError> {
    let response = match query.limit {
        Some(0) => return Err(ApiError::bad_request("limit must be positive", None)),
        Some(limit) => {
            let posts = state.blog.recent_posts(limit).await.map_err(app_to_api)?;
            Json(PostListResponse { posts: &posts }).into_response()
        }
        None => {
            let posts = state.blog.list_posts().await.map_err(app_to_api)?;
            Json(PostListResponse { posts: &posts }).into_response()
        }
    };
    Ok(response)
}

pub async fn get_post(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.blog.post_by_slug(&slug).await.map_err(app_to_api)?;
    Ok((StatusCode::OK, Json(post)))
}
