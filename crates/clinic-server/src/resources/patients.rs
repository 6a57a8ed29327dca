//! `/patients`: patient registry with generated patient numbers.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiResult, PageParams, active_flag, archive_record, create_record, fetch_record, list_records,
    search, update_record,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Patients;

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PatientInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list).post(create))
        .route("/patients/{id}", get(fetch).put(update))
        .route("/patients/{id}/archive", patch(archive))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<PatientQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        search(&["first_name", "last_name", "patient_no"], &q.search),
        active_flag(&q.is_active),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<PatientInput>,
) -> ApiResult<Value> {
    create_record(&state, KIND, &input).await
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<PatientInput>,
) -> ApiResult<Value> {
    update_record(&state, KIND, &id, &input).await
}

async fn archive(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    archive_record(&state, KIND, &id).await
}
