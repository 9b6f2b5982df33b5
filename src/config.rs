use anyhow::Context;

use crate::error::TrackerError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUCKET: &str = "documents";

/// Settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub storage: Option<StorageConfig>,
}

/// Object storage used for certificates and brochures.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub api_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .context("DATABASE_URL must be set to the Postgres instance holding events")?;

        let max_connections = match lookup("TRACKER_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("TRACKER_MAX_CONNECTIONS is not a number: {value}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let storage = match (lookup("STORAGE_URL"), lookup("STORAGE_KEY")) {
            (Some(base_url), Some(api_key)) => Some(StorageConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                bucket: lookup("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                api_key,
            }),
            _ => None,
        };

        Ok(AppConfig {
            database_url,
            max_connections,
            storage,
        })
    }

    pub fn storage(&self) -> Result<&StorageConfig, TrackerError> {
        self.storage.as_ref().ok_or_else(|| {
            TrackerError::Config("STORAGE_URL and STORAGE_KEY must be set to upload documents".into())
        })
    }
}
