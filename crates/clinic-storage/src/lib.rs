//! # clinic-storage
//!
//! Storage abstraction layer for the clinic records server.
//!
//! This crate defines the traits and types that all record backends
//! implement. It contains no implementations; those live in
//! `clinic-db-memory` and `clinic-db-postgres`.
//!
//! ## Overview
//!
//! The main trait is [`RecordStore`], which covers:
//! - list queries (filter, sort, paginate)
//! - single-record reads
//! - create, merge-update, toggle and delete
//!
//! ## Example
//!
//! ```ignore
//! use clinic_storage::{Filter, ListQuery, RecordStore};
//!
//! async fn low_stock_medicines(store: &dyn RecordStore) -> Result<Page, StorageError> {
//!     let query = ListQuery::new(1, 50).with_filter(Filter::low_stock());
//!     store.list(ResourceKind::Medicines, &query).await
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::RecordStore;
pub use types::{Filter, ListQuery, MAX_EXPIRY_DAYS, Page, SortParam};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared store trait object.
pub type DynStore = std::sync::Arc<dyn RecordStore>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::RecordStore;
    pub use crate::types::{Filter, ListQuery, MAX_EXPIRY_DAYS, Page, SortParam};
    pub use crate::{DynStore, StorageResult};
}
