use crate::domain::{PostWithFeed, User};
use crate::errors::{GatorError, GatorResult};
use crate::storage::traits::PostRepository;

pub const DEFAULT_BROWSE_LIMIT: usize = 2;

pub struct PostService<P: PostRepository> {
    repository: P,
}

impl<P: PostRepository> PostService<P> {
    pub fn new(repository: P) -> Self {
        Self { repository }
    }

    /// Newest posts from the feeds `user` follows
    pub fn browse(&self, user: &User, limit: usize) -> GatorResult<Vec<PostWithFeed>> {
        if limit == 0 {
            return Err(GatorError::InvalidInput("Limit must be at least 1".to_string()));
        }
        self.repository.for_user(user.id, limit)
    }
}
