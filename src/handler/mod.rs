pub mod health;
pub mod post;
pub mod security;
pub mod user;
