use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use super::security::CurrentUser;
use crate::app::state::AppState;
use crate::domain::{
    Comment, CommentIn, PostLike, PostLikeIn, PostSorting, UserPost, UserPostIn,
    UserPostWithComments, UserPostWithLikes,
};
use crate::error::ApiError;

#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    #[serde(default)]
    pub sorting: PostSorting,
}

async fn find_post(state: &AppState, post_id: u64) -> Result<Option<UserPost>, ApiError> {
    info!("Finding post with id {post_id}");
    debug!("SELECT * FROM posts WHERE id = {post_id}");
    Ok(state.store.find_post(post_id).await?)
}

/// Handler for POST /post
pub async fn create_post_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(post): Json<UserPostIn>,
) -> Result<(StatusCode, Json<UserPost>), ApiError> {
    info!("Creating post");
    debug!("INSERT INTO posts (body, user_id) VALUES (?, {})", user.id);
    let created = state.store.insert_post(post.body, user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /post
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserPostWithLikes>>, ApiError> {
    info!("Getting all posts");
    debug!(sorting = ?params.sorting, "SELECT posts.*, count(likes.id) AS likes FROM posts LEFT JOIN likes GROUP BY posts.id");
    Ok(Json(state.store.list_posts(params.sorting).await?))
}

/// Handler for POST /comment
pub async fn create_comment_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(comment): Json<CommentIn>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    info!("Creating comment");

    if find_post(&state, comment.post_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Post with id {} not found!",
            comment.post_id
        )));
    }

    debug!(
        "INSERT INTO comments (body, post_id, user_id) VALUES (?, {}, {})",
        comment.post_id, user.id
    );
    let created = state
        .store
        .insert_comment(comment.body, comment.post_id, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for GET /post/{post_id}/comment
pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<u64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    info!("Getting comments on post");
    debug!("SELECT * FROM comments WHERE post_id = {post_id}");
    Ok(Json(state.store.comments_for_post(post_id).await?))
}

/// Handler for GET /post/{post_id}
pub async fn get_post_with_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<u64>,
) -> Result<Json<UserPostWithComments>, ApiError> {
    info!("Getting post and its comments");
    debug!("SELECT posts.*, count(likes.id) AS likes FROM posts LEFT JOIN likes WHERE posts.id = {post_id} GROUP BY posts.id");

    let post = state
        .store
        .find_post_with_likes(post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Post with id {post_id} not found!")))?;
    let comments = state.store.comments_for_post(post_id).await?;

    Ok(Json(UserPostWithComments { post, comments }))
}

/// Handler for POST /like
pub async fn like_post_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(like): Json<PostLikeIn>,
) -> Result<(StatusCode, Json<PostLike>), ApiError> {
    info!("Liking post");

    if find_post(&state, like.post_id).await?.is_none() {
        return Err(ApiError::NotFound("Post not found!".to_string()));
    }

    debug!(
        "INSERT INTO likes (post_id, user_id) VALUES ({}, {})",
        like.post_id, user.id
    );
    let created = state.store.insert_like(like.post_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
