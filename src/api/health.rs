use crate::api::AppState;
use crate::error::AppError;
use axum::{extract::State, Json};

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the store answers and the configured season is loaded.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let season = state.engine.season();
    let loaded = state.repo.get_season(season).await?;
    match loaded {
        Some(s) => Ok(Json(serde_json::json!({
            "status": "ready",
            "season": season.to_string(),
            "completed": s.is_completed(),
        }))),
        None => Err(AppError::NotFound(format!("season {} is not loaded", season))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
