use crate::handler::health::health_handler;
use crate::handler::post::{
    create_comment_handler, create_post_handler, get_post_with_comments_handler,
    like_post_handler, list_comments_handler, list_posts_handler,
};
use crate::handler::user::register_handler;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use super::middleware::correlation_middleware;
use super::state::AppState;

/// Build the HTTP router. Every route runs inside a correlation scope.
pub fn main_router(state: AppState) -> Router {
    let user_router = Router::new().route("/register", post(register_handler));

    let post_router = Router::new()
        .route("/post", post(create_post_handler).get(list_posts_handler))
        .route("/post/{post_id}", get(get_post_with_comments_handler))
        .route("/post/{post_id}/comment", get(list_comments_handler))
        .route("/comment", post(create_comment_handler))
        .route("/like", post(like_post_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(user_router)
        .merge(post_router)
        .layer(from_fn_with_state(state.clone(), correlation_middleware))
        .with_state(state)
}
