use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::{CandidateId, ClaimantId};
use crate::error::AppError;
use crate::orchestration::reports::{self, BoardEntry, Squad};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub in_play: Option<CandidateId>,
    pub claimants: Vec<BoardEntry>,
}

pub async fn get_board(State(state): State<AppState>) -> Result<Json<BoardResponse>, AppError> {
    let engine = &state.engine;
    let selection = engine.snapshot().await;
    let in_play = selection.in_play().map(|slot| &slot.candidate);

    let limits = engine.read_model().session_limits(engine.season()).await?;
    let claimants = engine.read_model().claimants(engine.season()).await?;

    Ok(Json(BoardResponse {
        in_play: in_play.map(|c| c.id.clone()),
        claimants: reports::claimant_board(&claimants, &limits, in_play),
    }))
}

pub async fn get_squad(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Squad>, AppError> {
    let engine = &state.engine;
    let claimant = ClaimantId::new(id);
    // 404 for unknown claimants rather than an empty squad
    engine.read_model().claimant(engine.season(), &claimant).await?;

    let rows = state.repo.list_results(engine.season()).await?;
    Ok(Json(reports::squad(&rows, &claimant)))
}
