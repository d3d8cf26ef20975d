//! Hook for the expense store: rolls back what a deleted expense contributed.

use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::delete,
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemovedContributions {
    expense_id: String,
    removed: usize,
}

async fn expense_deleted(
    Path(expense_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RemovedContributions>> {
    let removed = state
        .goal_service
        .remove_contributions_for_expense(&expense_id)
        .await?;
    Ok(Json(RemovedContributions {
        expense_id,
        removed,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/expenses/{id}/contributions", delete(expense_deleted))
}
