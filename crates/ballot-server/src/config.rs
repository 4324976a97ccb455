use std::path::PathBuf;

use anyhow::Context;

/// Salt values that ship in examples and must not reach production.
const PLACEHOLDER_SALTS: &[&str] = &["dev_salt_change_me", "change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub vote_salt: String,
    pub host: String,
    pub port: u16,
    /// Upper bound on remembered user sessions; `None` keeps every user.
    pub session_capacity: Option<usize>,
    pub start_photo: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let db_path: PathBuf = var("BALLOT_DB_PATH")
            .unwrap_or_else(|| "data/data.db".into())
            .into();
        let vote_salt = var("BALLOT_VOTE_SALT").unwrap_or_else(|| "dev_salt_change_me".into());
        let host = var("BALLOT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("BALLOT_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse::<u16>()
            .context("BALLOT_PORT must be a port number")?;
        let session_capacity = var("BALLOT_SESSION_CAPACITY")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("BALLOT_SESSION_CAPACITY must be a positive integer")?;
        if session_capacity == Some(0) {
            anyhow::bail!("BALLOT_SESSION_CAPACITY must be a positive integer");
        }
        let start_photo = var("BALLOT_START_PHOTO");

        Ok(Self {
            db_path,
            vote_salt,
            host,
            port,
            session_capacity,
            start_photo,
        })
    }

    pub fn uses_placeholder_salt(&self) -> bool {
        PLACEHOLDER_SALTS.contains(&self.vote_salt.as_str())
    }
}
