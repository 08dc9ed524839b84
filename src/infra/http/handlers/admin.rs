use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::admin::posts::CreatePostCommand;
use crate::infra::http::error::{ApiError, post_to_api};
use crate::infra::http::models::{
    CacheInvalidateResponse, PostCreateRequest, PostListResponse, PostUpdateRequest,
};
use crate::infra::http::state::HttpState;

/// Dashboard listing. Always reads through to the store.
pub async fn list_posts(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.admin.list().await.map_err(post_to_api)?;
    Ok(Json(PostListResponse { posts: &posts }).into_response())
}

pub async fn create_post(
    State(state): State<HttpState>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .admin
        .create_post(CreatePostCommand::from(payload))
        .await
        .map_err(post_to_api)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_post(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .admin
        .update_post(payload.into_command(id))
        .await
        .map_err(post_to_api)?;

    Ok(Json(outcome))
}

pub async fn delete_post(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.admin.delete_post(&id).await.map_err(post_to_api)?;
    Ok(Json(outcome))
}

pub async fn cache_status(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.admin.cache_status())
}

pub async fn invalidate_cache(State(state): State<HttpState>) -> impl IntoResponse {
    state.admin.invalidate_cache();
    Json(CacheInvalidateResponse {
        invalidated: true,
        cache: state.admin.cache_status(),
    })
}
