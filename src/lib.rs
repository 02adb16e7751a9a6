pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::ReadModel;
pub use db::{init_db, Repository};
pub use domain::{
    Amount, CandidateDescriptor, CandidateId, CandidateStatus, ClaimantAggregate, ClaimantId,
    Outcome, ResolutionRecord, ReversalHandle, SeasonCode, SessionLimits, TimeMs,
};
pub use engine::{AuctionError, SelectionMode, SelectionState};
pub use error::AppError;
pub use orchestration::{AuctionEngine, EngineOptions, SettlementCoordinator};
