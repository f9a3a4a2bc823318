mod app;
mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use app::{Services, start_rest_server};
use infrastructure::config::{AppConfig, StorageBackend};
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::security::JwtKeys;
use tracing::warn;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let keys = JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_minutes);

    let services = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Services::postgres(pool, keys)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on restart");
            Services::in_memory(keys)
        }
    };

    start_rest_server(config, services).await
}
