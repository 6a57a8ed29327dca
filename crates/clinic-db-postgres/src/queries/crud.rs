//! Statements behind each `RecordStore` operation.
//!
//! Every mutation is a single statement, so concurrent requests against the
//! same row are serialised by PostgreSQL's row locks. A list reads its page
//! and its total from one read-only snapshot.

use clinic_core::{ResourceKind, now_timestamp, stamp_new_record, update_patch};
use clinic_storage::{Filter, ListQuery, Page, StorageError};
use serde_json::{Map, Value};
use sqlx_core::error::Error as SqlxError;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::{PgPool, Postgres};
use time::OffsetDateTime;

use super::BindAllParams;
use super::builder::{select_count, select_page};
use crate::error::PostgresError;

fn db_error(err: SqlxError) -> StorageError {
    tracing::warn!(error = %err, "PostgreSQL statement failed");
    PostgresError::from(err).into()
}

pub async fn list(
    pool: &PgPool,
    kind: ResourceKind,
    list_query: &ListQuery,
) -> Result<Page, StorageError> {
    let page = select_page(kind.as_str(), list_query);
    tracing::debug!(kind = %kind, sql = %page.sql, params = page.params.len(), "list query");

    let counted = select_count(kind.as_str(), &list_query.filters);

    let mut tx = pool.begin().await.map_err(db_error)?;
    query::<Postgres>("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    let items: Vec<Value> = query_scalar::<Postgres, Value>(&page.sql)
        .bind_all_params(&page.params)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error)?;
    let total: i64 = query_scalar::<Postgres, i64>(&counted.sql)
        .bind_all_params(&counted.params)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(Page::new(items, u64::try_from(total).unwrap_or(0)))
}

pub async fn count(
    pool: &PgPool,
    kind: ResourceKind,
    filters: &[Filter],
) -> Result<u64, StorageError> {
    let built = select_count(kind.as_str(), filters);
    let total: i64 = query_scalar::<Postgres, i64>(&built.sql)
        .bind_all_params(&built.params)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    Ok(u64::try_from(total).unwrap_or(0))
}

pub async fn read(
    pool: &PgPool,
    kind: ResourceKind,
    id: &str,
) -> Result<Option<Value>, StorageError> {
    let sql = format!("SELECT resource FROM {} WHERE id = $1", kind.as_str());
    query_scalar::<Postgres, Value>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

/// Draws the next value of the table's id sequence.
async fn next_seq(pool: &PgPool, kind: ResourceKind) -> Result<u64, StorageError> {
    let seq: i64 =
        query_scalar::<Postgres, i64>("SELECT nextval(pg_get_serial_sequence($1, 'seq'))")
            .bind(kind.as_str())
            .fetch_one(pool)
            .await
            .map_err(db_error)?;
    u64::try_from(seq).map_err(|_| StorageError::internal(format!("negative sequence value {seq}")))
}

pub async fn create(
    pool: &PgPool,
    kind: ResourceKind,
    fields: Map<String, Value>,
) -> Result<Value, StorageError> {
    let seq = next_seq(pool, kind).await?;
    let record = Value::Object(stamp_new_record(
        kind,
        seq,
        OffsetDateTime::now_utc(),
        fields,
    )?);
    let seq = i64::try_from(seq)
        .map_err(|_| StorageError::internal(format!("sequence value {seq} out of range")))?;

    let sql = format!(
        "INSERT INTO {} (seq, id, resource) VALUES ($1, $2, $3) RETURNING resource",
        kind.as_str()
    );
    let created: Value = query_scalar::<Postgres, Value>(&sql)
        .bind(seq)
        .bind(seq.to_string())
        .bind(&record)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;

    tracing::debug!(kind = %kind, id = seq, "record created");
    Ok(created)
}

pub async fn update(
    pool: &PgPool,
    kind: ResourceKind,
    id: &str,
    changes: Map<String, Value>,
) -> Result<Option<Value>, StorageError> {
    let patch = Value::Object(update_patch(changes, now_timestamp()?));
    let sql = format!(
        "UPDATE {} SET resource = resource || $2, updated_at = now() \
         WHERE id = $1 RETURNING resource",
        kind.as_str()
    );
    query_scalar::<Postgres, Value>(&sql)
        .bind(id)
        .bind(&patch)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

pub async fn toggle_active(
    pool: &PgPool,
    kind: ResourceKind,
    id: &str,
) -> Result<Option<Value>, StorageError> {
    let sql = format!(
        "UPDATE {} SET resource = resource || jsonb_build_object(\
             'is_active', NOT COALESCE(resource -> 'is_active' = 'true'::jsonb, FALSE), \
             'updated_at', $2::text), \
         updated_at = now() \
         WHERE id = $1 RETURNING resource",
        kind.as_str()
    );
    query_scalar::<Postgres, Value>(&sql)
        .bind(id)
        .bind(now_timestamp()?)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

pub async fn delete(pool: &PgPool, kind: ResourceKind, id: &str) -> Result<bool, StorageError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", kind.as_str());
    let result = query::<Postgres>(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected() > 0)
}
