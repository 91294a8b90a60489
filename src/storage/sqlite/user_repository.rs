use chrono::Utc;
use rusqlite::Row;

use crate::domain::User;
use crate::errors::{GatorError, GatorResult};
use crate::storage::sqlite::connection::sql_timestamp;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::UserRepository;

pub struct SqliteUserRepository {
    storage: SqliteStorage,
}

impl SqliteUserRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

impl UserRepository for SqliteUserRepository {
    fn create(&self, name: &str) -> GatorResult<User> {
        let conn = self.storage.connection()?;

        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM users WHERE name = ?1)")?;
        let exists: bool = stmt.query_row([name], |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(GatorError::UserAlreadyExists(name.to_string()));
        }

        let now = Utc::now();
        let stamp = sql_timestamp(&now);
        conn.execute(
            "INSERT INTO users (name, created_at, updated_at) VALUES (?1, ?2, ?3)",
            (name, &stamp, &stamp),
        )?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, name, created_at, updated_at FROM users WHERE id = ?1",
            [id],
            user_from_row,
        )
        .map_err(GatorError::from)
    }

    fn get_by_name(&self, name: &str) -> GatorResult<Option<User>> {
        let conn = self.storage.connection()?;
        let user = conn.query_row(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?1",
            [name],
            user_from_row,
        );

        match user {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(GatorError::from(e)),
        }
    }

    fn get_all(&self) -> GatorResult<Vec<User>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT id, name, created_at, updated_at FROM users ORDER BY name")?;

        let users = stmt.query_map([], user_from_row)?;
        users.collect::<Result<Vec<_>, _>>().map_err(GatorError::from)
    }

    fn reset(&self) -> GatorResult<usize> {
        let conn = self.storage.connection()?;
        Ok(conn.execute("DELETE FROM users", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteUserRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteUserRepository::new(storage)
    }

    #[test]
    fn test_create_and_get_user() {
        let repo = setup_repo();

        let created = repo.create("kahya").unwrap();
        assert!(created.id > 0);
        assert_eq!(created.name, "kahya");

        let retrieved = repo.get_by_name("kahya").unwrap().unwrap();
        assert_eq!(retrieved, created);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let repo = setup_repo();
        repo.create("kahya").unwrap();

        let result = repo.create("kahya");
        assert!(matches!(result, Err(GatorError::UserAlreadyExists(_))));
    }

    #[test]
    fn test_missing_user_is_none() {
        let repo = setup_repo();
        assert!(repo.get_by_name("nobody").unwrap().is_none());
    }

    #[test]
    fn test_get_all_sorted_by_name() {
        let repo = setup_repo();
        repo.create("holgith").unwrap();
        repo.create("kahya").unwrap();
        repo.create("ballan").unwrap();

        let names: Vec<String> = repo.get_all().unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["ballan", "holgith", "kahya"]);
    }

    #[test]
    fn test_reset_removes_everyone() {
        let repo = setup_repo();
        repo.create("kahya").unwrap();
        repo.create("holgith").unwrap();

        assert_eq!(repo.reset().unwrap(), 2);
        assert!(repo.get_all().unwrap().is_empty());
    }
}
