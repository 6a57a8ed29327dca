//! Storage traits for the record storage abstraction layer.

use async_trait::async_trait;
use clinic_core::ResourceKind;
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::types::{Filter, ListQuery, Page};

/// The storage contract every record backend implements.
///
/// A store owns one ordered collection per [`ResourceKind`]. Records are
/// JSON objects; the store assigns `id`, `created_at` and `updated_at` and
/// keeps them consistent across mutations. Implementations must be
/// thread-safe and must apply each mutation atomically per record.
///
/// # Example
///
/// ```ignore
/// use clinic_storage::{RecordStore, StorageError};
///
/// async fn get_patient(store: &dyn RecordStore, id: &str) -> Result<Value, StorageError> {
///     store
///         .get(ResourceKind::Patients, id)
///         .await?
///         .ok_or_else(|| StorageError::not_found(ResourceKind::Patients, id))
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Filters, sorts and paginates one collection.
    ///
    /// Without a sort parameter records come back in insertion order. Pages
    /// past the end yield an empty page with the real total.
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page, StorageError>;

    /// Counts the records matching every filter.
    async fn count(&self, kind: ResourceKind, filters: &[Filter]) -> Result<u64, StorageError>;

    /// Reads a record by id. Returns `None` if it does not exist.
    async fn get(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>, StorageError>;

    /// Creates a record from caller-supplied fields.
    ///
    /// The store draws the next value of the kind's monotonic sequence and
    /// stamps id, generated code and timestamps (see
    /// [`clinic_core::stamp_new_record`]).
    async fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<Value, StorageError>;

    /// Shallow-merges `changes` onto an existing record and refreshes
    /// `updated_at`. Returns `None` if the record does not exist.
    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError>;

    /// Flips `is_active` (absent counts as `false`) and refreshes
    /// `updated_at`. Returns `None` if the record does not exist.
    async fn toggle_active(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Value>, StorageError>;

    /// Removes a record. Returns `false` if it did not exist.
    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<bool, StorageError>;

    /// Returns the name of this backend for logging.
    fn backend_name(&self) -> &'static str;
}
