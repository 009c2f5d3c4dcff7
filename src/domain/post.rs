use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
pub struct UserPostIn {
    pub body: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserPost {
    pub id: u64,
    pub body: String,
    pub user_id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserPostWithLikes {
    pub id: u64,
    pub body: String,
    pub user_id: u64,
    pub likes: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommentIn {
    pub body: String,
    pub post_id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub post_id: u64,
    pub user_id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserPostWithComments {
    pub post: UserPostWithLikes,
    pub comments: Vec<Comment>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PostLikeIn {
    pub post_id: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PostLike {
    pub id: u64,
    pub post_id: u64,
    pub user_id: u64,
}

/// Ordering for the post listing.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostSorting {
    #[default]
    New,
    Old,
    MostLikes,
    LeastLikes,
}

impl PostSorting {
    /// Order posts in place. Ties on like count fall back to id order.
    pub fn sort(self, posts: &mut [UserPostWithLikes]) {
        match self {
            PostSorting::New => posts.sort_by(|a, b| b.id.cmp(&a.id)),
            PostSorting::Old => posts.sort_by(|a, b| a.id.cmp(&b.id)),
            PostSorting::MostLikes => {
                posts.sort_by(|a, b| b.likes.cmp(&a.likes).then(a.id.cmp(&b.id)));
            }
            PostSorting::LeastLikes => {
                posts.sort_by(|a, b| a.likes.cmp(&b.likes).then(a.id.cmp(&b.id)));
            }
        }
    }
}
