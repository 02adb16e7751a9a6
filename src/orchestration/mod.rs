pub mod auction;
pub mod reports;
pub mod settlement;

pub use auction::{AuctionEngine, EngineOptions};
pub use settlement::SettlementCoordinator;
