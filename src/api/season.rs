use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::domain::Season;
use crate::error::AppError;

pub async fn get_season(State(state): State<AppState>) -> Result<Json<Season>, AppError> {
    let engine = &state.engine;
    let season = engine.read_model().season(engine.season()).await?;
    Ok(Json(season))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub note: Option<String>,
}

pub async fn complete(
    State(state): State<AppState>,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<Season>, AppError> {
    let engine = &state.engine;
    let note = body.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    engine.complete_season(note).await?;

    let season = engine.read_model().season(engine.season()).await?;
    Ok(Json(season))
}
