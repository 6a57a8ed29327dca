//! PostgreSQL implementation of the `RecordStore` trait.

use async_trait::async_trait;
use clinic_core::ResourceKind;
use clinic_storage::{Filter, ListQuery, Page, RecordStore, StorageError};
use serde_json::{Map, Value};
use sqlx_postgres::PgPool;

use crate::config::PostgresConfig;
use crate::migrations;
use crate::pool;
use crate::queries::crud;

/// PostgreSQL record store.
///
/// Each resource kind maps to one table holding the record as JSONB.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new `PostgresStore` with the given configuration.
    ///
    /// Opens the pool, then applies migrations when `run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, the server cannot be
    /// reached, or a migration fails.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresStore` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page, StorageError> {
        crud::list(&self.pool, kind, query).await
    }

    async fn count(&self, kind: ResourceKind, filters: &[Filter]) -> Result<u64, StorageError> {
        crud::count(&self.pool, kind, filters).await
    }

    async fn get(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>, StorageError> {
        crud::read(&self.pool, kind, id).await
    }

    async fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<Value, StorageError> {
        crud::create(&self.pool, kind, fields).await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError> {
        crud::update(&self.pool, kind, id, changes).await
    }

    async fn toggle_active(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Value>, StorageError> {
        crud::toggle_active(&self.pool, kind, id).await
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<bool, StorageError> {
        crud::delete(&self.pool, kind, id).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
