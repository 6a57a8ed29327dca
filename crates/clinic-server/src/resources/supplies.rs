//! `/supplies`: consumables inventory.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use clinic_api::ApiError;
use clinic_core::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{
    ApiResult, PageParams, StockInput, active_flag, archive_record, check_date, create_record,
    expiring, fetch_record, list_records, low_stock, search, substring, update_record,
    update_stock,
};
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Supplies;

#[derive(Debug, Default, Deserialize)]
pub struct SupplyQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub category: Option<String>,
    pub search: Option<String>,
    pub low_stock: Option<String>,
    pub expiring: Option<String>,
    pub days: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SupplyInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<Number>,
    pub reorder_threshold: Option<Number>,
    pub expiry_date: Option<String>,
    pub supplier: Option<String>,
    pub is_active: Option<bool>,
}

impl SupplyInput {
    fn validate(&self) -> Result<(), ApiError> {
        check_date("expiry_date", &self.expiry_date)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/supplies", get(list).post(create))
        .route("/supplies/{id}", get(fetch).put(update))
        .route("/supplies/{id}/stock", patch(stock))
        .route("/supplies/{id}/archive", patch(archive))
}

async fn list(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<SupplyQuery>,
) -> ApiResult<Vec<Value>> {
    let filters = [
        substring("category", &q.category),
        search(&["name"], &q.search),
        low_stock(&q.low_stock),
        expiring(&q.expiring, &q.days),
        active_flag(&q.is_active),
    ];
    list_records(&state, KIND, &q.page, filters).await
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    fetch_record(&state, KIND, &id).await
}

async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<SupplyInput>,
) -> ApiResult<Value> {
    input.validate()?;
    create_record(&state, KIND, &input).await
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<SupplyInput>,
) -> ApiResult<Value> {
    input.validate()?;
    update_record(&state, KIND, &id, &input).await
}

async fn stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(input): AppJson<StockInput>,
) -> ApiResult<Value> {
    update_stock(&state, KIND, &id, input).await
}

async fn archive(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    archive_record(&state, KIND, &id).await
}
