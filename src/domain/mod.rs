//! Domain types for the auction allocation engine.
//!
//! This module provides:
//! - Lossless monetary amounts via the `Amount` wrapper
//! - Identifier newtypes for candidates, claimants, seasons and reversal handles
//! - Read-model shapes: session limits, claimant aggregates, candidate descriptors
//! - Resolution records produced by settlement

pub mod amount;
pub mod candidate;
pub mod claimant;
pub mod primitives;
pub mod resolution;
pub mod season;

pub use amount::Amount;
pub use candidate::{CandidateDescriptor, CandidateSnapshot, CandidateStatus};
pub use claimant::{Charge, ClaimantAggregate};
pub use primitives::{CandidateId, ClaimantId, ReversalHandle, SeasonCode, TimeMs};
pub use resolution::{Outcome, ResolutionRecord};
pub use season::{Season, SessionLimits};
