use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    info!("connected to PostgreSQL");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");
    sqlx::migrate!().run(pool).await?;
    info!("migrations completed");
    Ok(())
}

/// Migrated pool for tests that need a real database. `None` when
/// `DATABASE_URL` is unset so those tests pass vacuously on machines
/// without Postgres.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };
    let pool = create_pool(&url).await.expect("connect to DATABASE_URL");
    run_migrations(&pool).await.expect("migrate test database");
    Some(pool)
}
