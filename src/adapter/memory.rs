//! In-memory `SocialStore` with auto-increment ids starting at 1.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::domain::{Comment, PostLike, PostSorting, User, UserPost, UserPostWithLikes};
use crate::error::StoreError;
use crate::port::{SocialStore, StoreFuture};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    posts: BTreeMap<u64, UserPost>,
    comments: BTreeMap<u64, Comment>,
    likes: BTreeMap<u64, PostLike>,
}

impl Tables {
    fn like_count(&self, post_id: u64) -> u64 {
        self.likes.values().filter(|l| l.post_id == post_id).count() as u64
    }

    fn with_likes(&self, post: &UserPost) -> UserPostWithLikes {
        UserPostWithLikes {
            id: post.id,
            body: post.body.clone(),
            user_id: post.user_id,
            likes: self.like_count(post.id),
        }
    }
}

fn next_id<T>(table: &BTreeMap<u64, T>) -> u64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }

    pub fn like_count(&self, post_id: u64) -> u64 {
        self.tables.read().like_count(post_id)
    }
}

impl SocialStore for InMemoryStore {
    fn create_user(&self, email: String, access_token: String) -> StoreFuture<'_, User> {
        Box::pin(async move {
            let mut tables = self.tables.write();
            if tables.users.values().any(|u| u.email == email) {
                return Err(StoreError::DuplicateEmail(email));
            }
            let user = User {
                id: next_id(&tables.users),
                email,
                access_token,
            };
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn find_user_by_email(&self, email: &str) -> StoreFuture<'_, Option<User>> {
        let email = email.to_string();
        Box::pin(async move {
            let tables = self.tables.read();
            Ok(tables.users.values().find(|u| u.email == email).cloned())
        })
    }

    fn find_user_by_token(&self, token: &str) -> StoreFuture<'_, Option<User>> {
        let token = token.to_string();
        Box::pin(async move {
            let tables = self.tables.read();
            Ok(tables
                .users
                .values()
                .find(|u| u.access_token == token)
                .cloned())
        })
    }

    fn insert_post(&self, body: String, user_id: u64) -> StoreFuture<'_, UserPost> {
        Box::pin(async move {
            let mut tables = self.tables.write();
            let post = UserPost {
                id: next_id(&tables.posts),
                body,
                user_id,
            };
            tables.posts.insert(post.id, post.clone());
            Ok(post)
        })
    }

    fn find_post(&self, post_id: u64) -> StoreFuture<'_, Option<UserPost>> {
        Box::pin(async move { Ok(self.tables.read().posts.get(&post_id).cloned()) })
    }

    fn find_post_with_likes(&self, post_id: u64) -> StoreFuture<'_, Option<UserPostWithLikes>> {
        Box::pin(async move {
            let tables = self.tables.read();
            Ok(tables.posts.get(&post_id).map(|p| tables.with_likes(p)))
        })
    }

    fn list_posts(&self, sorting: PostSorting) -> StoreFuture<'_, Vec<UserPostWithLikes>> {
        Box::pin(async move {
            let mut posts: Vec<UserPostWithLikes> = {
                let tables = self.tables.read();
                tables.posts.values().map(|p| tables.with_likes(p)).collect()
            };
            sorting.sort(&mut posts);
            Ok(posts)
        })
    }

    fn insert_comment(&self, body: String, post_id: u64, user_id: u64) -> StoreFuture<'_, Comment> {
        Box::pin(async move {
            let mut tables = self.tables.write();
            let comment = Comment {
                id: next_id(&tables.comments),
                body,
                post_id,
                user_id,
            };
            tables.comments.insert(comment.id, comment.clone());
            Ok(comment)
        })
    }

    fn comments_for_post(&self, post_id: u64) -> StoreFuture<'_, Vec<Comment>> {
        Box::pin(async move {
            let tables = self.tables.read();
            Ok(tables
                .comments
                .values()
                .filter(|c| c.post_id == post_id)
                .cloned()
                .collect())
        })
    }

    fn insert_like(&self, post_id: u64, user_id: u64) -> StoreFuture<'_, PostLike> {
        Box::pin(async move {
            let mut tables = self.tables.write();
            let like = PostLike {
                id: next_id(&tables.likes),
                post_id,
                user_id,
            };
            tables.likes.insert(like.id, like.clone());
            Ok(like)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_user_assigns_ids() {
        let store = InMemoryStore::new();
        let a = store.create_user("a@x.com".into(), "t1".into()).await.unwrap();
        let b = store.create_user("b@x.com".into(), "t2".into()).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.user_count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        store.create_user("a@x.com".into(), "t1".into()).await.unwrap();
        let err = store.create_user("a@x.com".into(), "t2".into()).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_find_user() {
        let store = InMemoryStore::new();
        let user = store.create_user("a@x.com".into(), "tok".into()).await.unwrap();
        assert_eq!(store.find_user_by_token("tok").await.unwrap(), Some(user.clone()));
        assert_eq!(store.find_user_by_email("a@x.com").await.unwrap(), Some(user));
        assert_eq!(store.find_user_by_token("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_posts_with_likes_and_sorting() {
        let store = InMemoryStore::new();
        let first = store.insert_post("first".into(), 1).await.unwrap();
        let second = store.insert_post("second".into(), 1).await.unwrap();
        store.insert_like(first.id, 1).await.unwrap();
        store.insert_like(first.id, 2).await.unwrap();

        let posts = store.list_posts(PostSorting::MostLikes).await.unwrap();
        assert_eq!(posts[0].id, first.id);
        assert_eq!(posts[0].likes, 2);
        assert_eq!(posts[1].likes, 0);

        let posts = store.list_posts(PostSorting::New).await.unwrap();
        assert_eq!(posts[0].id, second.id);

        let found = store.find_post_with_likes(first.id).await.unwrap().unwrap();
        assert_eq!(found.likes, 2);
        assert!(store.find_post_with_likes(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_scoped_to_post() {
        let store = InMemoryStore::new();
        let post = store.insert_post("p".into(), 1).await.unwrap();
        let other = store.insert_post("q".into(), 1).await.unwrap();
        store.insert_comment("c1".into(), post.id, 1).await.unwrap();
        store.insert_comment("c2".into(), other.id, 1).await.unwrap();

        let comments = store.comments_for_post(post.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "c1");
        assert!(store.comments_for_post(42).await.unwrap().is_empty());
    }
}
