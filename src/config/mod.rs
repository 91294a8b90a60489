mod session;

pub use session::Session;

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{GatorError, GatorResult};
use crate::feed::DEFAULT_FETCH_TIMEOUT;

const SESSION_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub session_path: PathBuf,
    pub fetch_timeout: Duration,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> GatorResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("GATOR_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("gator.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./gator.db".to_string())
        });

        let session_path = match std::env::var_os("GATOR_CONFIG_PATH") {
            Some(path) => PathBuf::from(path),
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(SESSION_FILE_NAME))
                .ok_or_else(|| {
                    GatorError::Config("Set HOME or GATOR_CONFIG_PATH".to_string())
                })?,
        };

        let fetch_timeout = match std::env::var("GATOR_FETCH_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout_secs(&raw)?,
            Err(_) => DEFAULT_FETCH_TIMEOUT,
        };

        Ok(Self {
            db_path,
            session_path,
            fetch_timeout,
        })
    }
}

fn parse_timeout_secs(raw: &str) -> GatorResult<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(GatorError::Config(format!(
            "GATOR_FETCH_TIMEOUT_SECS must be a positive number of seconds, got {:?}",
            raw
        ))),
    }
}
