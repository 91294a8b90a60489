use chrono::Utc;
use rusqlite::Row;

use crate::domain::FeedFollow;
use crate::errors::{GatorError, GatorResult};
use crate::storage::sqlite::connection::{is_unique_violation, sql_timestamp};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::FollowRepository;

const FOLLOW_SELECT: &str = "SELECT ff.id, ff.user_id, ff.feed_id, u.name, f.name, ff.created_at
     FROM feed_follows ff
     JOIN users u ON u.id = ff.user_id
     JOIN feeds f ON f.id = ff.feed_id";

pub struct SqliteFollowRepository {
    storage: SqliteStorage,
}

impl SqliteFollowRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn follow_from_row(row: &Row<'_>) -> rusqlite::Result<FeedFollow> {
    Ok(FeedFollow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        feed_id: row.get(2)?,
        user_name: row.get(3)?,
        feed_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl FollowRepository for SqliteFollowRepository {
    fn follow(&self, user_id: i64, feed_id: i64) -> GatorResult<FeedFollow> {
        let conn = self.storage.connection()?;
        let stamp = sql_timestamp(&Utc::now());

        let inserted = conn.execute(
            "INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            (user_id, feed_id, &stamp, &stamp),
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(GatorError::AlreadyFollowing(feed_id.to_string()));
            }
            Err(e) => return Err(GatorError::from(e)),
        }

        let id = conn.last_insert_rowid();
        let query = format!("{} WHERE ff.id = ?1", FOLLOW_SELECT);
        conn.query_row(&query, [id], follow_from_row)
            .map_err(GatorError::from)
    }

    fn following(&self, user_id: i64) -> GatorResult<Vec<FeedFollow>> {
        let conn = self.storage.connection()?;
        let query = format!("{} WHERE ff.user_id = ?1 ORDER BY f.name", FOLLOW_SELECT);
        let mut stmt = conn.prepare(&query)?;

        let follows = stmt.query_map([user_id], follow_from_row)?;
        follows.collect::<Result<Vec<_>, _>>().map_err(GatorError::from)
    }

    fn unfollow(&self, user_id: i64, feed_id: i64) -> GatorResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute(
            "DELETE FROM feed_follows WHERE user_id = ?1 AND feed_id = ?2",
            [user_id, feed_id],
        )?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Feed;
    use crate::storage::sqlite::{SqliteFeedRepository, SqliteUserRepository};
    use crate::storage::traits::{FeedRepository, UserRepository};

    struct Fixture {
        follows: SqliteFollowRepository,
        users: SqliteUserRepository,
        feeds: SqliteFeedRepository,
    }

    fn setup() -> Fixture {
        let storage = SqliteStorage::in_memory().unwrap();
        Fixture {
            follows: SqliteFollowRepository::new(storage.clone()),
            users: SqliteUserRepository::new(storage.clone()),
            feeds: SqliteFeedRepository::new(storage),
        }
    }

    fn add_feed(fixture: &Fixture, user_id: i64, name: &str) -> i64 {
        let url = format!("https://{}.example.com/rss", name);
        let feed = Feed::new(name.to_string(), url, user_id);
        fixture.feeds.add(&feed).unwrap()
    }

    #[test]
    fn test_follow_returns_names() {
        let fixture = setup();
        let user = fixture.users.create("kahya").unwrap();
        let feed_id = add_feed(&fixture, user.id, "hn");

        let follow = fixture.follows.follow(user.id, feed_id).unwrap();
        assert_eq!(follow.user_name, "kahya");
        assert_eq!(follow.feed_name, "hn");
        assert_eq!(follow.feed_id, feed_id);
    }

    #[test]
    fn test_follow_twice_rejected() {
        let fixture = setup();
        let user = fixture.users.create("kahya").unwrap();
        let feed_id = add_feed(&fixture, user.id, "hn");

        fixture.follows.follow(user.id, feed_id).unwrap();
        let result = fixture.follows.follow(user.id, feed_id);
        assert!(matches!(result, Err(GatorError::AlreadyFollowing(_))));
    }

    #[test]
    fn test_following_is_per_user() {
        let fixture = setup();
        let kahya = fixture.users.create("kahya").unwrap();
        let holgith = fixture.users.create("holgith").unwrap();
        let hn = add_feed(&fixture, kahya.id, "hn");
        let lobsters = add_feed(&fixture, kahya.id, "lobsters");

        fixture.follows.follow(kahya.id, lobsters).unwrap();
        fixture.follows.follow(kahya.id, hn).unwrap();
        fixture.follows.follow(holgith.id, hn).unwrap();

        let names: Vec<String> = fixture
            .follows
            .following(kahya.id)
            .unwrap()
            .into_iter()
            .map(|f| f.feed_name)
            .collect();
        assert_eq!(names, vec!["hn", "lobsters"]);
        assert_eq!(fixture.follows.following(holgith.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unfollow() {
        let fixture = setup();
        let user = fixture.users.create("kahya").unwrap();
        let feed_id = add_feed(&fixture, user.id, "hn");
        fixture.follows.follow(user.id, feed_id).unwrap();

        assert!(fixture.follows.unfollow(user.id, feed_id).unwrap());
        assert!(!fixture.follows.unfollow(user.id, feed_id).unwrap());
        assert!(fixture.follows.following(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_reset_cascades_to_follows() {
        let fixture = setup();
        let user = fixture.users.create("kahya").unwrap();
        let feed_id = add_feed(&fixture, user.id, "hn");
        fixture.follows.follow(user.id, feed_id).unwrap();

        fixture.users.reset().unwrap();

        assert!(fixture.feeds.get_by_id(feed_id).unwrap().is_none());
        assert!(fixture.follows.following(user.id).unwrap().is_empty());
    }
}
