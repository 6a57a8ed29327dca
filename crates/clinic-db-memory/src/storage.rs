use std::collections::HashMap;

use async_trait::async_trait;
use clinic_core::{ResourceKind, now_timestamp, stamp_new_record, update_patch};
use clinic_storage::{Filter, ListQuery, Page, RecordStore, StorageError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::query::{matches_all, paginate, sort_records};

/// One kind's records in insertion order plus its id sequence.
#[derive(Debug)]
struct Collection {
    records: IndexMap<String, Value>,
    /// Next id to hand out. Never decreases, so deleted ids are not reused.
    next_seq: u64,
}

impl Collection {
    fn new() -> Self {
        Self {
            records: IndexMap::new(),
            next_seq: 1,
        }
    }
}

/// In-memory record store.
///
/// Every [`ResourceKind`] owns a separate collection behind its own lock.
/// Mutations take the write lock for the duration of the read-modify-write,
/// so concurrent creates never share an id and concurrent updates to the
/// same record never lose fields.
#[derive(Debug)]
pub struct InMemoryStore {
    collections: HashMap<ResourceKind, RwLock<Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let collections = ResourceKind::ALL
            .into_iter()
            .map(|kind| (kind, RwLock::new(Collection::new())))
            .collect();
        Self { collections }
    }

    fn collection(&self, kind: ResourceKind) -> Result<&RwLock<Collection>, StorageError> {
        self.collections
            .get(&kind)
            .ok_or_else(|| StorageError::internal(format!("no collection for {kind}")))
    }

    /// Number of stored records of a kind, regardless of filters.
    pub async fn len(&self, kind: ResourceKind) -> usize {
        match self.collections.get(&kind) {
            Some(collection) => collection.read().await.records.len(),
            None => 0,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<Page, StorageError> {
        let today = OffsetDateTime::now_utc().date();
        let guard = self.collection(kind)?.read().await;
        let mut matching: Vec<Value> = guard
            .records
            .values()
            .filter(|record| matches_all(&query.filters, record, today))
            .cloned()
            .collect();
        drop(guard);

        if let Some(sort) = &query.sort {
            sort_records(&mut matching, sort);
        }

        let total = matching.len() as u64;
        let items = paginate(matching, query.offset(), query.limit);
        Ok(Page::new(items, total))
    }

    async fn count(&self, kind: ResourceKind, filters: &[Filter]) -> Result<u64, StorageError> {
        let today = OffsetDateTime::now_utc().date();
        let guard = self.collection(kind)?.read().await;
        let count = guard
            .records
            .values()
            .filter(|record| matches_all(filters, record, today))
            .count();
        Ok(count as u64)
    }

    async fn get(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>, StorageError> {
        let guard = self.collection(kind)?.read().await;
        Ok(guard.records.get(id).cloned())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<Value, StorageError> {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.collection(kind)?.write().await;
        let seq = guard.next_seq;
        let record = Value::Object(stamp_new_record(kind, seq, now, fields)?);
        guard.next_seq += 1;
        guard.records.insert(seq.to_string(), record.clone());

        tracing::debug!(kind = %kind, id = seq, "record created");
        Ok(record)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError> {
        let timestamp = now_timestamp()?;
        let mut guard = self.collection(kind)?.write().await;
        let Some(Value::Object(record)) = guard.records.get_mut(id) else {
            return Ok(None);
        };
        record.extend(update_patch(changes, timestamp));
        Ok(Some(Value::Object(record.clone())))
    }

    async fn toggle_active(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<Value>, StorageError> {
        let timestamp = now_timestamp()?;
        let mut guard = self.collection(kind)?.write().await;
        let Some(Value::Object(record)) = guard.records.get_mut(id) else {
            return Ok(None);
        };
        let active = record
            .get("is_active")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        record.insert("is_active".to_string(), Value::Bool(!active));
        record.insert("updated_at".to_string(), Value::String(timestamp));
        Ok(Some(Value::Object(record.clone())))
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<bool, StorageError> {
        let mut guard = self.collection(kind)?.write().await;
        let removed = guard.records.shift_remove(id).is_some();
        if removed {
            tracing::debug!(kind = %kind, id, "record deleted");
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::into_object;
    use clinic_storage::SortParam;
    use serde_json::json;
    use std::sync::Arc;

    fn fields(value: Value) -> Map<String, Value> {
        into_object(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let created = store
            .create(
                ResourceKind::Patients,
                fields(json!({"first_name": "Ana", "last_name": "Cruz"})),
            )
            .await
            .unwrap();
        assert_eq!(created["id"], "1");
        assert_eq!(created["patient_no"], "2024-0001");
        assert_eq!(created["is_active"], true);

        let fetched = store.get(ResourceKind::Patients, "1").await.unwrap();
        assert_eq!(fetched, Some(created));
        assert!(store.get(ResourceKind::Patients, "2").await.unwrap().is_none());
        assert!(store.get(ResourceKind::Medicines, "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        for name in ["a", "b"] {
            store
                .create(ResourceKind::AdminUsers, fields(json!({"name": name})))
                .await
                .unwrap();
        }
        assert!(store.delete(ResourceKind::AdminUsers, "2").await.unwrap());
        assert!(!store.delete(ResourceKind::AdminUsers, "2").await.unwrap());

        let third = store
            .create(ResourceKind::AdminUsers, fields(json!({"name": "c"})))
            .await
            .unwrap();
        assert_eq!(third["id"], "3");
        assert_eq!(store.len(ResourceKind::AdminUsers).await, 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_store_fields() {
        let store = InMemoryStore::new();
        let created = store
            .create(
                ResourceKind::Equipment,
                fields(json!({"name": "ECG", "status": "operational"})),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                ResourceKind::Equipment,
                "1",
                fields(json!({"status": "maintenance", "id": "42"})),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], "1");
        assert_eq!(updated["name"], "ECG");
        assert_eq!(updated["status"], "maintenance");
        assert_eq!(updated["code"], "EQP001");
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(updated["updated_at"].as_str() >= created["updated_at"].as_str());

        let missing = store
            .update(ResourceKind::Equipment, "9", Map::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_toggle_active_flips_and_treats_absent_as_false() {
        let store = InMemoryStore::new();
        store
            .create(ResourceKind::Equipment, fields(json!({"name": "X-ray"})))
            .await
            .unwrap();
        let off = store
            .toggle_active(ResourceKind::Equipment, "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(off["is_active"], false);
        let on = store
            .toggle_active(ResourceKind::Equipment, "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(on["is_active"], true);

        store
            .create(ResourceKind::Logs, fields(json!({"action": "login"})))
            .await
            .unwrap();
        let log = store
            .toggle_active(ResourceKind::Logs, "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log["is_active"], true);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = InMemoryStore::new();
        for (name, quantity) in [("Amoxicillin", 5), ("Biogesic", 100), ("Cetirizine", 2)] {
            store
                .create(
                    ResourceKind::Medicines,
                    fields(json!({"name": name, "quantity": quantity, "reorder_threshold": 10})),
                )
                .await
                .unwrap();
        }

        let low = ListQuery::new(1, 50).with_filter(Filter::low_stock());
        let page = store.list(ResourceKind::Medicines, &low).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0]["name"], "Amoxicillin");
        assert_eq!(page.items[1]["name"], "Cetirizine");

        let second = store
            .list(ResourceKind::Medicines, &ListQuery::new(2, 2))
            .await
            .unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.len(), 1);
        assert_eq!(second.items[0]["name"], "Cetirizine");

        let beyond = store
            .list(ResourceKind::Medicines, &ListQuery::new(5, 2))
            .await
            .unwrap();
        assert_eq!(beyond.total, 3);
        assert!(beyond.is_empty());

        let count = store
            .count(ResourceKind::Medicines, &[Filter::contains("name", "BIO")])
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first() {
        let store = InMemoryStore::new();
        for (action, ts) in [
            ("login", "2024-01-01T08:00:00.000000Z"),
            ("create", "2024-02-01T08:00:00.000000Z"),
            ("logout", "2024-01-15T08:00:00.000000Z"),
        ] {
            store
                .create(
                    ResourceKind::Logs,
                    fields(json!({"action": action, "timestamp": ts})),
                )
                .await
                .unwrap();
        }
        let query =
            ListQuery::new(1, 2).with_sort(Some(SortParam::descending("timestamp")));
        let page = store.list(ResourceKind::Logs, &query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0]["action"], "create");
        assert_eq!(page.items[1]["action"], "logout");
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryStore::new());
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..50 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .create(ResourceKind::Supplies, fields(json!({"name": format!("s{i}")})))
                    .await
                    .unwrap()
            });
        }
        let mut ids = std::collections::HashSet::new();
        while let Some(record) = tasks.join_next().await {
            ids.insert(record.unwrap()["id"].as_str().unwrap().to_string());
        }
        assert_eq!(ids.len(), 50);
        assert_eq!(store.len(ResourceKind::Supplies).await, 50);
    }
}
