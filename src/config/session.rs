use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::User;
use crate::errors::{GatorError, GatorResult};
use crate::services::UserService;
use crate::storage::traits::UserRepository;

/// Who is logged in, persisted as JSON between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub db_url: String,
    #[serde(default)]
    pub current_user_name: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Session {
    /// Read the session file, starting empty if it does not exist yet.
    pub fn load(path: &Path) -> GatorResult<Self> {
        let mut session = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Session>(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Session::default(),
            Err(e) => return Err(e.into()),
        };
        session.path = path.to_path_buf();
        Ok(session)
    }

    pub fn set_user(&mut self, name: &str) -> GatorResult<()> {
        self.current_user_name = name.to_string();
        self.save()
    }

    fn save(&self) -> GatorResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Resolve the logged-in user. Commands that act on behalf of a user
    /// call this first and pass the result on.
    pub fn require_user<U: UserRepository>(&self, users: &UserService<U>) -> GatorResult<User> {
        if self.current_user_name.is_empty() {
            return Err(GatorError::NotLoggedIn);
        }
        users.get(&self.current_user_name)
    }
}
