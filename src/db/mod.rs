//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer for seasons, claimants, candidates and resolutions
//! - Seed loading from a JSON roster file

pub mod migrations;
pub mod repo;
pub mod seed;

pub use migrations::init_db;
pub use repo::Repository;
pub use seed::{apply_seed, load_seed, SeedError, SeedFile};

impl From<sqlx::Error> for crate::engine::AuctionError {
    fn from(err: sqlx::Error) -> Self {
        crate::engine::AuctionError::Storage(err.to_string())
    }
}
