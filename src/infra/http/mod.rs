//! HTTP surface: public blog reads and the password-gated admin API.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
mod state;

pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::warn;

use self::handlers::{admin, public};
use self::middleware::{admin_auth, log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    let mut router = Router::new()
        .route("/health", get(public::health))
        .route("/api/posts", get(public::list_posts))
        .route("/api/posts/{slug}", get(public::get_post));

    if state.admin_password.is_some() {
        router = router.merge(build_admin_router(state.clone()));
    } else {
        warn!(
            target = "studio_blog::http",
            "admin.password is not set; admin routes are disabled"
        );
    }

    router
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn build_admin_router(state: HttpState) -> Router<HttpState> {
    Router::new()
        .route(
            "/admin/api/posts",
            get(admin::list_posts).post(admin::create_post),
        )
        .route(
            "/admin/api/posts/{id}",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/admin/api/cache", get(admin::cache_status))
        .route("/admin/api/cache/invalidate", post(admin::invalidate_cache))
        .route_layer(axum_middleware::from_fn_with_state(state, admin_auth))
}
