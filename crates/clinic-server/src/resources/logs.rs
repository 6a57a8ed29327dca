//! `/logs`: append-only audit trail, listed newest first.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ApiResult, PageParams, RecordRef, create_record, exact, fetch_record, list_records, substring,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Logs;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub user: Option<String>,
}

/// A missing `timestamp` defaults to the creation time.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogInput {
    pub user: Option<String>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<RecordRef>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub timestamp: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list).post(create))
        .route("/logs/{id}", get(fetch))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<LogQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        exact("action", &q.action),
        exact("resource_type", &q.resource_type),
        substring("user", &q.user),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<LogInput>,
) -> ApiResult<Value> {
    create_record(&state, KIND, &input).await
}
