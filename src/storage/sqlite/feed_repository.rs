use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::domain::{Feed, FeedWithOwner};
use crate::errors::{GatorError, GatorResult};
use crate::storage::sqlite::connection::{is_unique_violation, sql_timestamp};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::FeedRepository;

const FEED_COLUMNS: &str =
    "f.id, f.name, f.url, f.user_id, f.created_at, f.updated_at, f.last_fetched_at";

pub struct SqliteFeedRepository {
    storage: SqliteStorage,
}

impl SqliteFeedRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn find_one(&self, filter: &str, param: &dyn rusqlite::ToSql) -> GatorResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let query = format!("SELECT {} FROM feeds f WHERE {}", FEED_COLUMNS, filter);

        let feed = conn.query_row(&query, [param], feed_from_row);

        match feed {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(GatorError::from(e)),
        }
    }
}

fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        url: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        last_fetched_at: row.get(6)?,
    })
}

impl FeedRepository for SqliteFeedRepository {
    fn add(&self, feed: &Feed) -> GatorResult<i64> {
        let conn = self.storage.connection()?;
        let stamp = sql_timestamp(&Utc::now());

        let inserted = conn.execute(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (&feed.name, &feed.url, feed.user_id, &stamp, &stamp),
        );

        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(GatorError::FeedAlreadyExists(feed.url.clone()))
            }
            Err(e) => Err(GatorError::from(e)),
        }
    }

    fn get_by_id(&self, id: i64) -> GatorResult<Option<Feed>> {
        self.find_one("f.id = ?1", &id)
    }

    fn get_by_url(&self, url: &str) -> GatorResult<Option<Feed>> {
        self.find_one("f.url = ?1", &url)
    }

    fn get_all_with_owners(&self) -> GatorResult<Vec<FeedWithOwner>> {
        let conn = self.storage.connection()?;
        let query = format!(
            "SELECT {}, u.name FROM feeds f JOIN users u ON u.id = f.user_id ORDER BY f.id",
            FEED_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;

        let feeds = stmt.query_map([], |row| {
            Ok(FeedWithOwner {
                feed: feed_from_row(row)?,
                owner_name: row.get(7)?,
            })
        })?;

        feeds.collect::<Result<Vec<_>, _>>().map_err(GatorError::from)
    }

    fn next_to_fetch(&self) -> GatorResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let query = format!(
            "SELECT {} FROM feeds f ORDER BY f.last_fetched_at ASC NULLS FIRST, f.id ASC LIMIT 1",
            FEED_COLUMNS
        );

        match conn.query_row(&query, [], feed_from_row) {
            Ok(feed) => {
                tracing::debug!(feed_id = ?feed.id, url = %feed.url, "Selected next feed to fetch");
                Ok(Some(feed))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(GatorError::from(e)),
        }
    }

    fn mark_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> GatorResult<()> {
        let conn = self.storage.connection()?;
        let stamp = sql_timestamp(&at);

        let updated = conn.execute(
            "UPDATE feeds SET last_fetched_at = ?2, updated_at = ?2
             WHERE id = ?1 AND (last_fetched_at IS NULL OR last_fetched_at <= ?2)",
            (feed_id, &stamp),
        )?;

        if updated == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM feeds WHERE id = ?1)",
                [feed_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(GatorError::FeedNotFound(feed_id.to_string()));
            }
            tracing::debug!(feed_id, "Ignoring fetch mark older than the recorded one");
        }

        Ok(())
    }
}
