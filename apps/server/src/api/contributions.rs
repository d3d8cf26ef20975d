use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use savings_ledger_core::goals::{AllocateSavingsRequest, NewContribution, SavingsContribution};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionQuery {
    goal_id: Option<String>,
}

async fn list_contributions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContributionQuery>,
) -> ApiResult<Json<Vec<SavingsContribution>>> {
    let contributions = state
        .goal_service
        .get_contributions(query.goal_id.as_deref())?;
    Ok(Json(contributions))
}

async fn add_contribution(
    State(state): State<Arc<AppState>>,
    Json(contribution): Json<NewContribution>,
) -> ApiResult<(StatusCode, Json<SavingsContribution>)> {
    let saved = state.goal_service.add_contribution(contribution).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn allocate_savings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AllocateSavingsRequest>,
) -> ApiResult<Json<Vec<SavingsContribution>>> {
    let saved = state.goal_service.allocate_savings(request).await?;
    Ok(Json(saved))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/contributions",
            get(list_contributions).post(add_contribution),
        )
        .route("/contributions/allocate", post(allocate_savings))
}
