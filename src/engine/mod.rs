//! Pure auction rules: eligibility, the RTM guard, the draw sampler and the
//! selection state machine. Nothing in here touches storage.

pub mod draw;
pub mod eligibility;
pub mod error;
pub mod rtm;
pub mod selection;

pub use draw::draw;
pub use eligibility::{board, eligible_pool, evaluate, Eligibility, IneligibleReason};
pub use error::AuctionError;
pub use rtm::{can_enable_rtm, describe as describe_rtm};
pub use selection::{default_amount, InPlay, SelectionMode, SelectionState, SettlementRequest};
