use crate::domain::User;
use crate::errors::{GatorError, GatorResult};
use crate::storage::traits::UserRepository;

pub struct UserService<U: UserRepository> {
    repository: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repository: U) -> Self {
        Self { repository }
    }

    pub fn register(&self, name: &str) -> GatorResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatorError::InvalidInput("Username is required".to_string()));
        }
        self.repository.create(name)
    }

    /// Look up an existing user by name
    pub fn get(&self, name: &str) -> GatorResult<User> {
        self.repository
            .get_by_name(name.trim())?
            .ok_or_else(|| GatorError::UserNotFound(name.to_string()))
    }

    pub fn list(&self) -> GatorResult<Vec<User>> {
        self.repository.get_all()
    }

    pub fn reset(&self) -> GatorResult<usize> {
        self.repository.reset()
    }
}
