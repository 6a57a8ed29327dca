//! `/dashboard/metrics`: live record counts plus a fixed monthly series.

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use clinic_api::ApiResponse;
use clinic_core::ResourceKind;
use clinic_storage::{Filter, ListQuery, SortParam};
use serde::Serialize;
use serde_json::Value;

use crate::resources::{ApiResult, DEFAULT_EXPIRY_DAYS};
use crate::state::AppState;

/// Number of log entries in the recent-activity feed.
pub const RECENT_ACTIVITY_LEN: u32 = 5;

const MONTHLY_CONSULTATIONS: [(&str, u32); 6] = [
    ("Jan", 45),
    ("Feb", 52),
    ("Mar", 48),
    ("Apr", 61),
    ("May", 55),
    ("Jun", 67),
];

#[derive(Debug, Serialize)]
pub struct Counts {
    pub medicines: u64,
    pub supplies: u64,
    pub equipment: u64,
    pub patients: u64,
    pub consultations: u64,
    pub admin_users: u64,
    pub low_stock_medicines: u64,
    pub low_stock_supplies: u64,
    pub expiring_medicines: u64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyCount {
    pub month: &'static str,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct Metrics {
    pub counts: Counts,
    pub monthly_consultations: Vec<MonthlyCount>,
    pub recent_activity: Vec<Value>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard/metrics", get(metrics))
}

async fn metrics(State(state): State<AppState>) -> ApiResult<Metrics> {
    let store = &state.store;
    let counts = Counts {
        medicines: store.count(ResourceKind::Medicines, &[]).await?,
        supplies: store.count(ResourceKind::Supplies, &[]).await?,
        equipment: store.count(ResourceKind::Equipment, &[]).await?,
        patients: store.count(ResourceKind::Patients, &[]).await?,
        consultations: store.count(ResourceKind::Consultations, &[]).await?,
        admin_users: store.count(ResourceKind::AdminUsers, &[]).await?,
        low_stock_medicines: store
            .count(ResourceKind::Medicines, &[Filter::low_stock()])
            .await?,
        low_stock_supplies: store
            .count(ResourceKind::Supplies, &[Filter::low_stock()])
            .await?,
        expiring_medicines: store
            .count(
                ResourceKind::Medicines,
                &[Filter::expires_within("expiry_date", DEFAULT_EXPIRY_DAYS)],
            )
            .await?,
    };

    let recent = ListQuery::new(1, RECENT_ACTIVITY_LEN)
        .with_sort(Some(SortParam::descending("timestamp")));
    let recent_activity = store.list(ResourceKind::Logs, &recent).await?.items;

    let monthly_consultations = MONTHLY_CONSULTATIONS
        .iter()
        .map(|&(month, count)| MonthlyCount { month, count })
        .collect();

    Ok(ApiResponse::ok(Metrics {
        counts,
        monthly_consultations,
        recent_activity,
    }))
}
