use url::Url;

use crate::domain::{Feed, FeedFollow, FeedWithOwner, User};
use crate::errors::{GatorError, GatorResult};
use crate::storage::traits::{FeedRepository, FollowRepository};

pub struct FeedService<R: FeedRepository, W: FollowRepository> {
    repository: R,
    follows: W,
}

impl<R: FeedRepository, W: FollowRepository> FeedService<R, W> {
    pub fn new(repository: R, follows: W) -> Self {
        Self { repository, follows }
    }

    /// Register a feed owned by `user` and follow it on their behalf
    pub fn add(&self, user: &User, name: &str, url: &str) -> GatorResult<(Feed, FeedFollow)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatorError::InvalidInput("Feed name is required".to_string()));
        }

        let url = validate_url(url)?;

        if self.repository.get_by_url(&url)?.is_some() {
            return Err(GatorError::FeedAlreadyExists(url));
        }

        let id = self
            .repository
            .add(&Feed::new(name.to_string(), url.clone(), user.id))?;
        let feed = self
            .repository
            .get_by_id(id)?
            .ok_or_else(|| GatorError::FeedNotFound(url))?;

        let follow = self.follows.follow(user.id, id)?;

        Ok((feed, follow))
    }

    /// List all feeds with the users that added them
    pub fn list(&self) -> GatorResult<Vec<FeedWithOwner>> {
        self.repository.get_all_with_owners()
    }
}

/// Accept only absolute http(s) URLs. The URL is stored as written so
/// later lookups by URL match what the user typed.
pub fn validate_url(raw: &str) -> GatorResult<String> {
    let trimmed = raw.trim();
    let parsed =
        Url::parse(trimmed).map_err(|e| GatorError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(GatorError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            trimmed, other
        ))),
    }
}
