use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use savings_ledger_core::goals::{LedgerSnapshot, SavingsGoal};

async fn export_ledger(State(state): State<Arc<AppState>>) -> ApiResult<Json<LedgerSnapshot>> {
    Ok(Json(state.goal_service.export_snapshot()?))
}

/// Replaces the ledger and returns the goals recalculation had to repair.
async fn import_ledger(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<LedgerSnapshot>,
) -> ApiResult<Json<Vec<SavingsGoal>>> {
    let repaired = state.goal_service.import_snapshot(snapshot).await?;
    Ok(Json(repaired))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ledger/export", get(export_ledger))
        .route("/ledger/import", post(import_ledger))
}
