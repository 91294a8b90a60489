use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: Option<i64>,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `None` until the first fetch; never-fetched feeds are polled first.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl Feed {
    pub fn new(name: String, url: String, user_id: i64) -> Self {
        Self {
            id: None,
            name,
            url,
            user_id,
            created_at: None,
            updated_at: None,
            last_fetched_at: None,
        }
    }
}

/// A feed joined with the name of the user who added it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub owner_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub user_name: String,
    pub feed_name: String,
    pub created_at: DateTime<Utc>,
}
