//! Route families for the stored resources.
//!
//! Every resource shares the same list contract (filter, sort, paginate)
//! and response envelope; the per-resource modules only declare their
//! query filters and request schemas.

pub mod admin_users;
pub mod consultations;
pub mod equipment;
pub mod logs;
pub mod medicines;
pub mod patients;
pub mod supplies;

use axum::Router;
use clinic_api::{ApiError, ApiResponse, Pagination};
use clinic_core::{ResourceKind, into_object, parse_date};
use clinic_storage::{Filter, ListQuery, SortParam, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};

use crate::config::PaginationConfig;
use crate::state::AppState;

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Expiry window used by `expiring=true` when `days` is absent.
pub const DEFAULT_EXPIRY_DAYS: u32 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(medicines::routes())
        .merge(supplies::routes())
        .merge(equipment::routes())
        .merge(patients::routes())
        .merge(consultations::routes())
        .merge(admin_users::routes())
        .merge(logs::routes())
}

// -------------------------
// Query parameters
// -------------------------

/// `page` and `limit`, kept as raw text so malformed values fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Resolves the page window: `page >= 1`, `limit` in `[1, max_limit]`.
    pub fn window(&self, cfg: &PaginationConfig) -> (u32, u32) {
        let page = parse_int(self.page.as_deref()).unwrap_or(1).max(1);
        let limit = parse_int(self.limit.as_deref())
            .unwrap_or(i64::from(cfg.default_limit))
            .clamp(1, i64::from(cfg.max_limit.max(1)));
        (
            u32::try_from(page).unwrap_or(u32::MAX),
            u32::try_from(limit).unwrap_or(cfg.max_limit),
        )
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim).and_then(|s| s.parse::<i64>().ok())
}

/// A query value that is present and non-empty.
pub(crate) fn text(param: &Option<String>) -> Option<&str> {
    param.as_deref().filter(|s| !s.is_empty())
}

pub(crate) fn is_true(param: &Option<String>) -> bool {
    text(param) == Some("true")
}

/// Exact match on the text form of a field.
pub(crate) fn exact(field: &str, param: &Option<String>) -> Option<Filter> {
    text(param).map(|value| Filter::equals(field, value))
}

/// Case-insensitive substring match on one field.
pub(crate) fn substring(field: &str, param: &Option<String>) -> Option<Filter> {
    text(param).map(|needle| Filter::contains(field, needle))
}

/// Case-insensitive substring match on any of the name-like fields.
pub(crate) fn search(fields: &[&str], param: &Option<String>) -> Option<Filter> {
    text(param).map(|needle| Filter::contains_any(fields.iter().copied(), needle))
}

/// `is_active=true|false`; any other non-empty value selects inactive records.
pub(crate) fn active_flag(param: &Option<String>) -> Option<Filter> {
    text(param).map(|value| Filter::equals("is_active", value == "true"))
}

pub(crate) fn low_stock(param: &Option<String>) -> Option<Filter> {
    is_true(param).then(Filter::low_stock)
}

pub(crate) fn expiring(expiring: &Option<String>, days: &Option<String>) -> Option<Filter> {
    if !is_true(expiring) {
        return None;
    }
    // Oversized windows saturate; the filter caps them further
    let days = text(days)
        .and_then(|d| d.trim().parse::<u64>().ok())
        .map_or(DEFAULT_EXPIRY_DAYS, |d| u32::try_from(d).unwrap_or(u32::MAX));
    Some(Filter::expires_within("expiry_date", days))
}

// -------------------------
// Request bodies
// -------------------------

/// An id reference that clients send either as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordRef {
    Number(Number),
    Text(String),
}

/// Body of `PATCH /{id}/stock`.
#[derive(Debug, Clone, Deserialize)]
pub struct StockInput {
    pub quantity: Number,
}

/// Rejects a date field that is present but not a calendar date.
pub(crate) fn check_date(field: &str, value: &Option<String>) -> Result<(), ApiError> {
    match value.as_deref() {
        Some(raw) if parse_date(raw).is_err() => Err(ApiError::bad_request(format!(
            "{field} must be a valid date (YYYY-MM-DD)"
        ))),
        _ => Ok(()),
    }
}

/// Allow-listed fields of a validated request body.
///
/// Absent and `null` fields are dropped, so they neither appear on new
/// records nor overwrite existing values.
pub(crate) fn fields_of<T: Serialize>(input: &T) -> Result<Map<String, Value>, ApiError> {
    let value = serde_json::to_value(input).map_err(|e| ApiError::internal(e.to_string()))?;
    let mut fields = into_object(value).map_err(StorageError::from)?;
    fields.retain(|_, v| !v.is_null());
    Ok(fields)
}

// -------------------------
// Shared handlers
// -------------------------

pub(crate) async fn list_records(
    state: &AppState,
    kind: ResourceKind,
    page: &PageParams,
    filters: impl IntoIterator<Item = Option<Filter>>,
) -> ApiResult<Vec<Value>> {
    let (page, limit) = page.window(state.pagination());
    let query = filters
        .into_iter()
        .fold(ListQuery::new(page, limit), ListQuery::with_optional_filter)
        .with_sort(kind.newest_first_field().map(SortParam::descending));

    let result = state.store.list(kind, &query).await?;
    tracing::debug!(kind = %kind, total = result.total, returned = result.len(), "listed records");
    Ok(ApiResponse::ok(result.items).with_pagination(Pagination::new(page, limit, result.total)))
}

pub(crate) async fn fetch_record(state: &AppState, kind: ResourceKind, id: &str) -> ApiResult<Value> {
    match state.store.get(kind, id).await? {
        Some(record) => Ok(ApiResponse::ok(record)),
        None => Err(ApiError::not_found(kind.not_found_message())),
    }
}

pub(crate) async fn create_record<T: Serialize>(
    state: &AppState,
    kind: ResourceKind,
    input: &T,
) -> ApiResult<Value> {
    let record = state.store.create(kind, fields_of(input)?).await?;
    tracing::info!(kind = %kind, id = %record["id"], "record created");
    Ok(ApiResponse::created(record)
        .with_message(format!("{} created successfully", kind.display_name())))
}

/// Merges `changes` onto a record, answering 404 when it is missing.
async fn apply_update(
    state: &AppState,
    kind: ResourceKind,
    id: &str,
    changes: Map<String, Value>,
    message: String,
) -> ApiResult<Value> {
    match state.store.update(kind, id, changes).await? {
        Some(record) => Ok(ApiResponse::ok(record).with_message(message)),
        None => Err(ApiError::not_found(kind.not_found_message())),
    }
}

pub(crate) async fn update_record<T: Serialize>(
    state: &AppState,
    kind: ResourceKind,
    id: &str,
    input: &T,
) -> ApiResult<Value> {
    let message = format!("{} updated successfully", kind.display_name());
    apply_update(state, kind, id, fields_of(input)?, message).await
}

/// Overwrites `quantity`; no delta, no bounds.
pub(crate) async fn update_stock(
    state: &AppState,
    kind: ResourceKind,
    id: &str,
    input: StockInput,
) -> ApiResult<Value> {
    let changes = object(json!({ "quantity": input.quantity }));
    apply_update(state, kind, id, changes, "Stock updated successfully".to_string()).await
}

/// Soft delete; archiving an archived record is a no-op success.
pub(crate) async fn archive_record(state: &AppState, kind: ResourceKind, id: &str) -> ApiResult<Value> {
    let changes = object(json!({ "is_active": false }));
    let message = format!("{} archived successfully", kind.display_name());
    apply_update(state, kind, id, changes, message).await
}

pub(crate) async fn toggle_record(state: &AppState, kind: ResourceKind, id: &str) -> ApiResult<Value> {
    match state.store.toggle_active(kind, id).await? {
        Some(record) => Ok(ApiResponse::ok(record)
            .with_message(format!("{} status updated successfully", kind.display_name()))),
        None => Err(ApiError::not_found(kind.not_found_message())),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
