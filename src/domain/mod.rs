//! Request and response shapes of the HTTP API.

pub mod post;
pub mod user;

pub use post::{
    Comment, CommentIn, PostLike, PostLikeIn, PostSorting, UserPost, UserPostIn,
    UserPostWithComments, UserPostWithLikes,
};
pub use user::{User, UserIn};
