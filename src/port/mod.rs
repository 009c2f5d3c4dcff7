pub mod social_store;

pub use social_store::{SocialStore, StoreFuture};
