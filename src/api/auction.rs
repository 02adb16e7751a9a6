use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{Amount, CandidateId, ClaimantId, Outcome, ResolutionRecord, ReversalHandle};
use crate::engine::{SelectionMode, SelectionState};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
    #[serde(flatten)]
    pub selection: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtm_status: Option<String>,
}

async fn view(state: &AppState, selection: SelectionState) -> Result<Json<AuctionView>, AppError> {
    let rtm_status = state.engine.rtm_status(&selection).await;
    Ok(Json(AuctionView {
        selection,
        rtm_status,
    }))
}

pub async fn get_auction(State(state): State<AppState>) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.snapshot().await;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentRequest {
    pub candidate_id: String,
}

pub async fn present(
    State(state): State<AppState>,
    Json(body): Json<PresentRequest>,
) -> Result<Json<AuctionView>, AppError> {
    if body.candidate_id.trim().is_empty() {
        return Err(AppError::BadRequest("candidateId must not be empty".to_string()));
    }
    let selection = state
        .engine
        .present(&CandidateId::new(body.candidate_id))
        .await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: SelectionMode,
}

pub async fn set_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeRequest>,
) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.set_mode(body.mode).await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooseRequest {
    pub claimant_id: String,
    pub amount: Option<Amount>,
    #[serde(default)]
    pub rtm: bool,
}

pub async fn choose(
    State(state): State<AppState>,
    Json(body): Json<ChooseRequest>,
) -> Result<Json<AuctionView>, AppError> {
    let selection = state
        .engine
        .choose(&ClaimantId::new(body.claimant_id), body.amount, body.rtm)
        .await?;
    view(&state, selection).await
}

pub async fn draw(State(state): State<AppState>) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.draw().await?;
    view(&state, selection).await
}

pub async fn reset_draw(State(state): State<AppState>) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.reset_draw().await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
pub struct RtmRequest {
    pub on: bool,
}

pub async fn toggle_rtm(
    State(state): State<AppState>,
    Json(body): Json<RtmRequest>,
) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.toggle_rtm(body.on).await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub steps: i32,
}

pub async fn adjust_amount(
    State(state): State<AppState>,
    Json(body): Json<AmountRequest>,
) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.adjust_amount(body.steps).await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub outcome: Outcome,
}

pub async fn resolve(
    State(state): State<AppState>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ResolutionRecord>, AppError> {
    let record = state.engine.resolve(body.outcome).await?;
    Ok(Json(record))
}

pub async fn cancel(State(state): State<AppState>) -> Result<Json<AuctionView>, AppError> {
    let selection = state.engine.cancel().await?;
    view(&state, selection).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    pub reversal_handle: String,
}

pub async fn revert(
    State(state): State<AppState>,
    Json(body): Json<RevertRequest>,
) -> Result<Json<ResolutionRecord>, AppError> {
    let record = state
        .engine
        .revert(&ReversalHandle::from_raw(body.reversal_handle))
        .await?;
    Ok(Json(record))
}
