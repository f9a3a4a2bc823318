use std::str::FromStr;

use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
const MAX_JWT_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("invalid STORAGE_BACKEND: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let storage = lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".into())
            .parse()?;
        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let jwt_ttl_minutes: i64 = lookup("JWT_TTL_MINUTES")
            .unwrap_or_else(|| "60".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid JWT_TTL_MINUTES: {}", e))?;
        if !(1..=MAX_JWT_TTL_MINUTES).contains(&jwt_ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {}, got {}",
                MAX_JWT_TTL_MINUTES,
                jwt_ttl_minutes
            );
        }
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            storage,
            database_url,
            jwt_secret,
            jwt_ttl_minutes,
            cors_origins,
        })
    }
}
