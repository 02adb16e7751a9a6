use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::domain::CandidateStatus;
use crate::error::AppError;
use crate::orchestration::reports::{self, ResultsFilter, ResultsReport};

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub level: Option<String>,
    pub status: Option<String>,
}

pub async fn get_results(
    Query(params): Query<ResultsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ResultsReport>, AppError> {
    let status = match params.status.as_deref() {
        Some("") | Some("all") | None => None,
        Some(s) => Some(s.parse::<CandidateStatus>().map_err(AppError::BadRequest)?),
    };
    let filter = ResultsFilter {
        level_code: params.level.filter(|l| !l.is_empty()),
        status,
    };

    let rows = state.repo.list_results(state.engine.season()).await?;
    Ok(Json(reports::results(&rows, &filter)))
}
