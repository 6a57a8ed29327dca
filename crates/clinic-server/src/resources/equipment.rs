//! `/equipment`: devices with generated `EQP###` codes.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiResult, PageParams, active_flag, create_record, exact, fetch_record, list_records, search,
    toggle_record, update_record,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Equipment;

#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EquipmentInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<String>,
    pub last_maintenance: Option<String>,
    pub is_active: Option<bool>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/equipment", get(list).post(create))
        .route("/equipment/{id}", get(fetch).put(update))
        .route("/equipment/{id}/toggle-active", patch(toggle))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<EquipmentQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        exact("type", &q.kind),
        exact("status", &q.status),
        search(&["name", "code"], &q.search),
        active_flag(&q.is_active),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<EquipmentInput>,
) -> ApiResult<Value> {
    create_record(&state, KIND, &input).await
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<EquipmentInput>,
) -> ApiResult<Value> {
    update_record(&state, KIND, &id, &input).await
}

async fn toggle(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    toggle_record(&state, KIND, &id).await
}
