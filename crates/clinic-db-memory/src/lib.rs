//! In-memory record storage backend for the clinic records server.
//!
//! This crate provides an in-memory implementation of the `RecordStore`
//! trait from `clinic-storage`. Each resource kind lives in its own
//! insertion-ordered collection behind a `tokio` read-write lock, so list
//! results without a sort come back in the order records were created.
//!
//! # Example
//!
//! ```ignore
//! use clinic_db_memory::InMemoryStore;
//! use clinic_storage::RecordStore;
//!
//! let store = InMemoryStore::new();
//! let fields = serde_json::json!({"first_name": "Ana", "last_name": "Cruz"});
//! let created = store
//!     .create(ResourceKind::Patients, clinic_core::into_object(fields)?)
//!     .await?;
//! assert_eq!(created["patient_no"], "2024-0001");
//! ```

pub mod query;
pub mod storage;

pub use clinic_storage::{RecordStore, StorageError};
pub use storage::InMemoryStore;

/// Creates a new shareable in-memory store.
pub fn create_store() -> clinic_storage::DynStore {
    std::sync::Arc::new(InMemoryStore::new())
}
