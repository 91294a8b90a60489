pub mod feed;
pub mod post;
pub mod user;

pub use feed::{Feed, FeedFollow, FeedWithOwner};
pub use post::{InsertOutcome, NewPost, Post, PostWithFeed};
pub use user::User;
