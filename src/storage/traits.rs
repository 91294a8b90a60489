use chrono::{DateTime, Utc};

use crate::domain::{Feed, FeedFollow, FeedWithOwner, InsertOutcome, NewPost, PostWithFeed, User};
use crate::errors::GatorResult;

#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    fn create(&self, name: &str) -> GatorResult<User>;
    fn get_by_name(&self, name: &str) -> GatorResult<Option<User>>;
    fn get_all(&self) -> GatorResult<Vec<User>>;
    /// Delete every user, cascading to their feeds, follows and posts.
    fn reset(&self) -> GatorResult<usize>;
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedRepository: Send + Sync {
    fn add(&self, feed: &Feed) -> GatorResult<i64>;
    fn get_by_id(&self, id: i64) -> GatorResult<Option<Feed>>;
    fn get_by_url(&self, url: &str) -> GatorResult<Option<Feed>>;
    fn get_all_with_owners(&self) -> GatorResult<Vec<FeedWithOwner>>;
    /// The feed fetched longest ago, never-fetched feeds first, ties broken
    /// by id.
    fn next_to_fetch(&self) -> GatorResult<Option<Feed>>;
    /// Record a fetch attempt. Never moves `last_fetched_at` backwards.
    fn mark_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> GatorResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait FollowRepository: Send + Sync {
    fn follow(&self, user_id: i64, feed_id: i64) -> GatorResult<FeedFollow>;
    fn following(&self, user_id: i64) -> GatorResult<Vec<FeedFollow>>;
    /// Returns whether a follow was removed.
    fn unfollow(&self, user_id: i64, feed_id: i64) -> GatorResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait PostRepository: Send + Sync {
    fn insert(&self, post: &NewPost) -> GatorResult<InsertOutcome>;
    fn count_for_feed(&self, feed_id: i64) -> GatorResult<usize>;
    /// Newest posts from the feeds a user follows.
    fn for_user(&self, user_id: i64, limit: usize) -> GatorResult<Vec<PostWithFeed>>;
}
