use crate::engine::AuctionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<AuctionError> for AppError {
    fn from(err: AuctionError) -> Self {
        let msg = err.to_string();
        match err {
            AuctionError::Validation(_)
            | AuctionError::Ineligible(_)
            | AuctionError::RtmNotAllowed
            | AuctionError::NoEligibleClaimants => AppError::Unprocessable(msg),
            AuctionError::AlreadyInPlay
            | AuctionError::AlreadyDrawn
            | AuctionError::InvalidTransition { .. }
            | AuctionError::Conflict(_)
            | AuctionError::AlreadyReverted => AppError::Conflict(msg),
            AuctionError::NotFound(_) => AppError::NotFound(msg),
            AuctionError::Storage(_) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auction_errors_map_to_status() {
        let cases = [
            (AuctionError::RtmNotAllowed, StatusCode::UNPROCESSABLE_ENTITY),
            (AuctionError::NoEligibleClaimants, StatusCode::UNPROCESSABLE_ENTITY),
            (AuctionError::AlreadyDrawn, StatusCode::CONFLICT),
            (AuctionError::AlreadyReverted, StatusCode::CONFLICT),
            (
                AuctionError::InvalidTransition {
                    op: "cancel the presentation",
                    state: "idle",
                },
                StatusCode::CONFLICT,
            ),
            (AuctionError::NotFound("claimant X".to_string()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
