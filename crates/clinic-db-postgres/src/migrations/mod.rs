//! Database migration management for the PostgreSQL storage backend.
//!
//! Migrations are embedded in the binary so the server needs no filesystem
//! access to bring a fresh database up to date.

use sqlx_core::migrate::{Migration, MigrationType};
use sqlx_postgres::PgPool;
use std::borrow::Cow;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// Add new migrations here in chronological order as
/// `(version, description, sql)`.
macro_rules! embedded_migrations {
    () => {
        &[
            (
                20240101000001i64,
                "clinic_schema",
                include_str!("../../migrations/20240101000001_clinic_schema.sql"),
            ),
            (
                20240101000002i64,
                "safe_date",
                include_str!("../../migrations/20240101000002_safe_date.sql"),
            ),
        ]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Runs all pending migrations. Applied versions are tracked in the
/// `_sqlx_migrations` table.
///
/// # Errors
///
/// Returns an error if a migration fails to execute.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running embedded database migrations");

    let migrator = sqlx_core::migrate::Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(format!("Migration failed: {e}")))?;

    info!("Database migrations completed successfully");

    Ok(())
}
