use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use savings_ledger_core::errors::Error as CoreError;
use savings_ledger_core::goals::{
    progress_percent, projected_completion_date, rollover_amount, saved_previous_month,
    GoalMetadataUpdate, NewSavingsGoal, SavingsGoal, SavingsGoalStatus, SavingsProgress,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<SavingsGoalStatus>,
}

/// A goal together with the figures a planning screen shows next to it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalDetail {
    #[serde(flatten)]
    goal: SavingsGoal,
    progress_percent: Decimal,
    monthly_savings: Decimal,
    projected_completion_date: Option<NaiveDate>,
    /// Last month's shortfall carried into this month
    rollover_amount: Decimal,
    category_label: Option<&'static str>,
    priority_label: Option<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VacationGoalRequest {
    name: String,
    target_amount: Decimal,
    target_date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequiredSavingsResponse {
    goal_id: String,
    required_monthly_savings: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthlyTargetResponse {
    monthly_target: Decimal,
}

async fn list_goals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<SavingsGoal>>> {
    let goals = state.goal_service.get_goals(query.status)?;
    Ok(Json(goals))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    Json(new_goal): Json<NewSavingsGoal>,
) -> ApiResult<(StatusCode, Json<SavingsGoal>)> {
    let goal = state.goal_service.create_goal(new_goal).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn get_goal(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<GoalDetail>> {
    let goal = state
        .goal_service
        .get_goal(&id)?
        .ok_or(ApiError::NotFound)?;
    let monthly_savings = state.goal_service.get_required_monthly_savings(&id)?;
    let today = state.goal_service.today();
    let contributions = state.goal_service.get_contributions(Some(id.as_str()))?;
    let saved = saved_previous_month(&contributions, today).ok_or_else(|| {
        CoreError::Unexpected(format!("contributions of goal {} overflow", id))
    })?;
    Ok(Json(GoalDetail {
        progress_percent: progress_percent(&goal),
        projected_completion_date: projected_completion_date(&goal, monthly_savings, today),
        rollover_amount: rollover_amount(&goal, monthly_savings, saved),
        category_label: goal.category.map(|c| c.label()),
        priority_label: goal.priority.map(|p| p.label()),
        monthly_savings,
        goal,
    }))
}

async fn create_vacation_goal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VacationGoalRequest>,
) -> ApiResult<(StatusCode, Json<SavingsGoal>)> {
    let new_goal = NewSavingsGoal::vacation_preset(
        &request.name,
        request.target_amount,
        request.target_date,
        state.goal_service.today(),
    );
    let goal = state.goal_service.create_goal(new_goal).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_goal(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<GoalMetadataUpdate>,
) -> ApiResult<Response> {
    match state.goal_service.update_goal_metadata(&id, update).await? {
        Some(goal) => Ok(Json(goal).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn delete_goal(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.goal_service.delete_goal(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn required_monthly_savings(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RequiredSavingsResponse>> {
    let required_monthly_savings = state.goal_service.get_required_monthly_savings(&id)?;
    Ok(Json(RequiredSavingsResponse {
        goal_id: id,
        required_monthly_savings,
    }))
}

async fn aggregate_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<SavingsProgress>> {
    let status = query.status.unwrap_or(SavingsGoalStatus::Active);
    Ok(Json(state.goal_service.get_aggregate_progress(status)?))
}

async fn monthly_target(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MonthlyTargetResponse>> {
    let monthly_target = state.goal_service.get_monthly_target()?;
    Ok(Json(MonthlyTargetResponse { monthly_target }))
}

async fn recalculate(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SavingsGoal>>> {
    let repaired = state.goal_service.recalculate().await?;
    Ok(Json(repaired))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/presets/vacation", post(create_vacation_goal))
        .route("/goals/progress", get(aggregate_progress))
        .route("/goals/monthly-target", get(monthly_target))
        .route("/goals/recalculate", post(recalculate))
        .route(
            "/goals/{id}",
            get(get_goal).put(update_goal).delete(delete_goal),
        )
        .route(
            "/goals/{id}/required-monthly-savings",
            get(required_monthly_savings),
        )
}
