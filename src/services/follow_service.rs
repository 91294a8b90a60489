use crate::domain::{Feed, FeedFollow, User};
use crate::errors::{GatorError, GatorResult};
use crate::storage::traits::{FeedRepository, FollowRepository};

pub struct FollowService<R: FeedRepository, W: FollowRepository> {
    feeds: R,
    repository: W,
}

impl<R: FeedRepository, W: FollowRepository> FollowService<R, W> {
    pub fn new(feeds: R, repository: W) -> Self {
        Self { feeds, repository }
    }

    pub fn follow(&self, user: &User, url: &str) -> GatorResult<FeedFollow> {
        let feed = self.find_feed(url)?;
        self.repository
            .follow(user.id, feed_id(&feed)?)
            .map_err(|e| match e {
                GatorError::AlreadyFollowing(_) => GatorError::AlreadyFollowing(feed.name.clone()),
                other => other,
            })
    }

    pub fn following(&self, user: &User) -> GatorResult<Vec<FeedFollow>> {
        self.repository.following(user.id)
    }

    /// Stop following the feed at `url`, returning it
    pub fn unfollow(&self, user: &User, url: &str) -> GatorResult<Feed> {
        let feed = self.find_feed(url)?;

        if !self.repository.unfollow(user.id, feed_id(&feed)?)? {
            return Err(GatorError::InvalidInput(format!("Not following {}", feed.name)));
        }

        Ok(feed)
    }

    fn find_feed(&self, url: &str) -> GatorResult<Feed> {
        self.feeds
            .get_by_url(url.trim())?
            .ok_or_else(|| GatorError::FeedNotFound(url.to_string()))
    }
}

fn feed_id(feed: &Feed) -> GatorResult<i64> {
    feed.id
        .ok_or_else(|| GatorError::FeedNotFound("Feed has no ID".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{
        SqliteFeedRepository, SqliteFollowRepository, SqliteStorage, SqliteUserRepository,
    };
    use crate::storage::traits::UserRepository;

    const URL: &str = "https://blog.boot.dev/index.xml";

    fn setup() -> (FollowService<SqliteFeedRepository, SqliteFollowRepository>, User, User) {
        let storage = SqliteStorage::in_memory().unwrap();
        let users = SqliteUserRepository::new(storage.clone());
        let owner = users.create("kahya").unwrap();
        let reader = users.create("holgith").unwrap();

        let feeds = SqliteFeedRepository::new(storage.clone());
        feeds
            .add(&Feed::new("Boot.dev Blog".to_string(), URL.to_string(), owner.id))
            .unwrap();

        let service = FollowService::new(feeds, SqliteFollowRepository::new(storage));
        (service, owner, reader)
    }

    #[test]
    fn test_follow_and_list() {
        let (service, _, reader) = setup();

        let follow = service.follow(&reader, URL).unwrap();
        assert_eq!(follow.feed_name, "Boot.dev Blog");
        assert_eq!(follow.user_name, "holgith");

        let following = service.following(&reader).unwrap();
        assert_eq!(following.len(), 1);
    }

    #[test]
    fn test_follow_twice_names_feed() {
        let (service, _, reader) = setup();
        service.follow(&reader, URL).unwrap();

        match service.follow(&reader, URL) {
            Err(GatorError::AlreadyFollowing(name)) => assert_eq!(name, "Boot.dev Blog"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_follow_unknown_feed() {
        let (service, _, reader) = setup();
        let result = service.follow(&reader, "https://nowhere.example.com/rss");
        assert!(matches!(result, Err(GatorError::FeedNotFound(_))));
    }

    #[test]
    fn test_unfollow() {
        let (service, _, reader) = setup();
        service.follow(&reader, URL).unwrap();

        let feed = service.unfollow(&reader, URL).unwrap();
        assert_eq!(feed.name, "Boot.dev Blog");
        assert!(service.following(&reader).unwrap().is_empty());

        assert!(matches!(
            service.unfollow(&reader, URL),
            Err(GatorError::InvalidInput(_))
        ));
    }
}
