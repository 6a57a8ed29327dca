//! `/consultations`: visit records linked to patients by `patient_id`.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiResult, PageParams, RecordRef, create_record, exact, fetch_record, list_records, substring,
    update_record,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Consultations;

#[derive(Debug, Default, Deserialize)]
pub struct ConsultationQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub physician: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<String>,
}

/// `patient_id` is stored as sent; it is not checked against patients.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConsultationInput {
    pub patient_id: Option<RecordRef>,
    pub physician: Option<String>,
    pub consultation_date: Option<String>,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/consultations", get(list).post(create))
        .route("/consultations/{id}", get(fetch).put(update))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ConsultationQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        substring("physician", &q.physician),
        exact("patient_id", &q.patient_id),
        exact("status", &q.status),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<ConsultationInput>,
) -> ApiResult<Value> {
    create_record(&state, KIND, &input).await
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<ConsultationInput>,
) -> ApiResult<Value> {
    update_record(&state, KIND, &id, &input).await
}
