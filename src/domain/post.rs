use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::FeedItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub feed_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a post. `(feed_id, url)` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

impl NewPost {
    pub fn from_item(feed_id: i64, item: &FeedItem, published_at: DateTime<Utc>) -> Self {
        Self {
            feed_id,
            title: item.title.clone(),
            url: item.link.clone(),
            description: item.description.clone(),
            published_at,
        }
    }
}

/// What happened to a single post insert. A link the feed already has is
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// A stored post with the name of the feed it came from, as shown by
/// `browse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithFeed {
    pub post: Post,
    pub feed_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_post_from_item() {
        let item = FeedItem::new(
            "Announcing Rust 1.75.0",
            "https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html",
            "Thu, 28 Dec 2023 00:00:00 +0000",
        )
        .with_description("async fn in traits");
        let published = Utc.with_ymd_and_hms(2023, 12, 28, 0, 0, 0).unwrap();

        let post = NewPost::from_item(7, &item, published);

        assert_eq!(post.feed_id, 7);
        assert_eq!(post.title, "Announcing Rust 1.75.0");
        assert_eq!(post.url, "https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html");
        assert_eq!(post.description, "async fn in traits");
        assert_eq!(post.published_at, published);
    }
}
