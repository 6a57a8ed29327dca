//! Connection pool for the PostgreSQL record store.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgPool, Postgres};
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};

pub type PgPoolOptions = PoolOptions<Postgres>;

/// Translates the store settings into pool options.
///
/// Connections are not pinged on checkout; a broken connection surfaces as
/// a statement error and is dropped by the pool.
pub fn pool_options(config: &PostgresConfig) -> Result<PgPoolOptions> {
    config.validate()?;

    let mut options = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .min_connections(config.effective_min_connections())
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
        .max_lifetime(Duration::from_secs(config.effective_max_lifetime_secs()))
        .test_before_acquire(false);
    if let Some(idle_ms) = config.idle_timeout_ms {
        options = options.idle_timeout(Duration::from_millis(idle_ms));
    }
    Ok(options)
}

/// Opens the pool and checks that the server answers.
#[instrument(skip(config), fields(url = %mask_password(&config.url)))]
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    let options = pool_options(config)?;
    info!(
        pool_size = config.pool_size,
        min_connections = config.effective_min_connections(),
        max_lifetime_secs = config.effective_max_lifetime_secs(),
        "opening PostgreSQL pool"
    );

    let pool = options.connect(&config.url).await?;
    ping(&pool).await?;
    Ok(pool)
}

/// Round-trips a trivial statement.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(PostgresError::from)?;
    debug!("PostgreSQL answered ping");
    Ok(())
}

/// Hides the password of a connection URL for logs.
pub fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map_or(0, |p| p + 3);
    if let Some(at) = url.rfind('@')
        && let Some(colon) = url[scheme_end..at].find(':').map(|c| c + scheme_end)
    {
        return format!("{}:****{}", &url[..colon], &url[at..]);
    }
    url.to_string()
}
