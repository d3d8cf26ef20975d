use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use savings_ledger_core::errors::Error as CoreError;
use savings_ledger_core::goals::GoalError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(CoreError::Goal(GoalError::GoalNotFound(_))) | ApiError::NotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Core(CoreError::Goal(_) | CoreError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(e) if e.is_storage_failure() => {
                tracing::error!("Storage failure, ledger may need recalculation: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Core(e) => {
                tracing::error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use savings_ledger_core::errors::DatabaseError;

    fn status_of(err: CoreError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_core_errors_map_to_status_codes() {
        assert_eq!(
            status_of(GoalError::GoalNotFound("g1".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(GoalError::InvalidContribution("overflow".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DatabaseError::QueryFailed("disk I/O error".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(CoreError::Unexpected("totals overflow".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
