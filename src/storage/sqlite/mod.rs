mod connection;
mod feed_repository;
mod follow_repository;
mod post_repository;
mod user_repository;

pub use connection::SqliteStorage;
pub use feed_repository::SqliteFeedRepository;
pub use follow_repository::SqliteFollowRepository;
pub use post_repository::SqlitePostRepository;
pub use user_repository::SqliteUserRepository;
