use crate::domain::{Comment, PostLike, PostSorting, User, UserPost, UserPostWithLikes};
use crate::error::StoreError;
use std::future::Future;
use std::pin::Pin;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persistence for users, posts, comments and likes.
///
/// This trait is dyn-compatible by using boxed futures instead of `impl Future`.
pub trait SocialStore: Send + Sync {
    /// Insert a user; fails with `DuplicateEmail` if the address is taken.
    fn create_user(&self, email: String, access_token: String) -> StoreFuture<'_, User>;

    fn find_user_by_email(&self, email: &str) -> StoreFuture<'_, Option<User>>;

    fn find_user_by_token(&self, token: &str) -> StoreFuture<'_, Option<User>>;

    fn insert_post(&self, body: String, user_id: u64) -> StoreFuture<'_, UserPost>;

    fn find_post(&self, post_id: u64) -> StoreFuture<'_, Option<UserPost>>;

    fn find_post_with_likes(&self, post_id: u64) -> StoreFuture<'_, Option<UserPostWithLikes>>;

    fn list_posts(&self, sorting: PostSorting) -> StoreFuture<'_, Vec<UserPostWithLikes>>;

    fn insert_comment(&self, body: String, post_id: u64, user_id: u64) -> StoreFuture<'_, Comment>;

    fn comments_for_post(&self, post_id: u64) -> StoreFuture<'_, Vec<Comment>>;

    fn insert_like(&self, post_id: u64, user_id: u64) -> StoreFuture<'_, PostLike>;
}
