pub mod auction;
pub mod claimants;
pub mod health;
pub mod results;
pub mod season;

use crate::db::Repository;
use crate::orchestration::AuctionEngine;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub engine: Arc<AuctionEngine>,
}

impl AppState {
    pub fn new(repo: Repository, engine: Arc<AuctionEngine>) -> Self {
        Self { repo, engine }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/auction", get(auction::get_auction))
        .route("/v1/auction/present", post(auction::present))
        .route("/v1/auction/mode", post(auction::set_mode))
        .route("/v1/auction/choose", post(auction::choose))
        .route("/v1/auction/draw", post(auction::draw))
        .route("/v1/auction/draw/reset", post(auction::reset_draw))
        .route("/v1/auction/rtm", post(auction::toggle_rtm))
        .route("/v1/auction/amount", post(auction::adjust_amount))
        .route("/v1/auction/resolve", post(auction::resolve))
        .route("/v1/auction/cancel", post(auction::cancel))
        .route("/v1/auction/revert", post(auction::revert))
        .route("/v1/claimants", get(claimants::get_board))
        .route("/v1/claimants/:id/squad", get(claimants::get_squad))
        .route("/v1/results", get(results::get_results))
        .route("/v1/season", get(season::get_season))
        .route("/v1/season/complete", post(season::complete))
        .layer(cors)
        .with_state(state)
}
