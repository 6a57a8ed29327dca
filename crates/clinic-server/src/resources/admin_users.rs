//! `/admin-users`: staff accounts. The only kind that supports hard deletes.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use clinic_api::{ApiError, ApiResponse};
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiResult, PageParams, active_flag, create_record, exact, fetch_record, list_records, search,
    toggle_record, update_record,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::AdminUsers;

#[derive(Debug, Default, Deserialize)]
pub struct AdminUserQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub role: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AdminUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin-users", get(list).post(create))
        .route("/admin-users/{id}", get(fetch).put(update).delete(remove))
        .route("/admin-users/{id}/toggle-active", patch(toggle))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<AdminUserQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        exact("role", &q.role),
        search(&["name", "email"], &q.search),
        active_flag(&q.is_active),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<AdminUserInput>,
) -> ApiResult<Value> {
    create_record(&state, KIND, &input).await
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<AdminUserInput>,
) -> ApiResult<Value> {
    update_record(&state, KIND, &id, &input).await
}

async fn toggle(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    toggle_record(&state, KIND, &id).await
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    if !state.store.delete(KIND, &id).await? {
        return Err(ApiError::not_found(KIND.not_found_message()));
    }
    tracing::info!(kind = %KIND, id = %id, "record deleted");
    Ok(ApiResponse::ok(Value::Null).with_message("Admin user deleted successfully"))
}
