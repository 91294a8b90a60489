use chrono::Utc;

use crate::domain::{InsertOutcome, NewPost, Post, PostWithFeed};
use crate::errors::{GatorError, GatorResult};
use crate::storage::sqlite::connection::sql_timestamp;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::PostRepository;

pub struct SqlitePostRepository {
    storage: SqliteStorage,
}

impl SqlitePostRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl PostRepository for SqlitePostRepository {
    fn insert(&self, post: &NewPost) -> GatorResult<InsertOutcome> {
        let conn = self.storage.connection()?;
        let stamp = sql_timestamp(&Utc::now());

        // Only the (feed_id, url) key is tolerated; other constraint failures
        // still surface as errors.
        let inserted = conn.execute(
            "INSERT INTO posts (title, url, description, published_at, feed_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (feed_id, url) DO NOTHING",
            (
                &post.title,
                &post.url,
                &post.description,
                sql_timestamp(&post.published_at),
                post.feed_id,
                &stamp,
                &stamp,
            ),
        )?;

        if inserted == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    fn count_for_feed(&self, feed_id: i64) -> GatorResult<usize> {
        let conn = self.storage.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE feed_id = ?1",
            [feed_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn for_user(&self, user_id: i64, limit: usize) -> GatorResult<Vec<PostWithFeed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.url, p.description, p.published_at, p.feed_id,
                    p.created_at, p.updated_at, f.name
             FROM posts p
             JOIN feed_follows ff ON ff.feed_id = p.feed_id
             JOIN feeds f ON f.id = p.feed_id
             WHERE ff.user_id = ?1
             ORDER BY p.published_at DESC, p.id DESC
             LIMIT ?2",
        )?;

        let posts = stmt.query_map((user_id, limit as i64), |row| {
            Ok(PostWithFeed {
                post: Post {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(2)?,
                    description: row.get(3)?,
                    published_at: row.get(4)?,
                    feed_id: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                },
                feed_name: row.get(8)?,
            })
        })?;

        posts.collect::<Result<Vec<_>, _>>().map_err(GatorError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Feed;
    use crate::storage::sqlite::{
        SqliteFeedRepository, SqliteFollowRepository, SqliteUserRepository,
    };
    use crate::storage::traits::{FeedRepository, FollowRepository, UserRepository};
    use chrono::{Duration, TimeZone};

    struct Fixture {
        posts: SqlitePostRepository,
        follows: SqliteFollowRepository,
        user_id: i64,
        feed_id: i64,
    }

    fn setup() -> Fixture {
        let storage = SqliteStorage::in_memory().unwrap();
        let user = SqliteUserRepository::new(storage.clone()).create("kahya").unwrap();
        let feed_id = SqliteFeedRepository::new(storage.clone())
            .add(&Feed::new("hn".to_string(), "https://hn.example.com/rss".to_string(), user.id))
            .unwrap();

        Fixture {
            posts: SqlitePostRepository::new(storage.clone()),
            follows: SqliteFollowRepository::new(storage),
            user_id: user.id,
            feed_id,
        }
    }

    fn new_post(feed_id: i64, url: &str, hours_ago: i64) -> NewPost {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        NewPost {
            feed_id,
            title: format!("Post at {}", url),
            url: url.to_string(),
            description: String::new(),
            published_at: base - Duration::hours(hours_ago),
        }
    }

    #[test]
    fn test_insert_then_duplicate() {
        let fixture = setup();
        let post = new_post(fixture.feed_id, "https://hn.example.com/1", 0);

        assert_eq!(fixture.posts.insert(&post).unwrap(), InsertOutcome::Inserted);
        assert_eq!(fixture.posts.insert(&post).unwrap(), InsertOutcome::AlreadyExists);
        assert_eq!(fixture.posts.count_for_feed(fixture.feed_id).unwrap(), 1);
    }

    #[test]
    fn test_unknown_feed_is_an_error() {
        let fixture = setup();
        let post = new_post(fixture.feed_id + 100, "https://hn.example.com/1", 0);

        assert!(matches!(fixture.posts.insert(&post), Err(GatorError::Database(_))));
    }

    #[test]
    fn test_for_user_only_followed_feeds_newest_first() {
        let fixture = setup();
        fixture.posts.insert(&new_post(fixture.feed_id, "https://hn.example.com/old", 5)).unwrap();
        fixture.posts.insert(&new_post(fixture.feed_id, "https://hn.example.com/new", 1)).unwrap();
        fixture.posts.insert(&new_post(fixture.feed_id, "https://hn.example.com/mid", 3)).unwrap();

        assert!(fixture.posts.for_user(fixture.user_id, 10).unwrap().is_empty());

        fixture.follows.follow(fixture.user_id, fixture.feed_id).unwrap();
        let posts = fixture.posts.for_user(fixture.user_id, 2).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].post.url, "https://hn.example.com/new");
        assert_eq!(posts[1].post.url, "https://hn.example.com/mid");
        assert_eq!(posts[0].feed_name, "hn");
        assert_eq!(
            posts[0].post.published_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap()
        );
    }
}
