//! Settlement engine — fee model, pot aggregation, payouts, reconciliation.

pub mod fee;
pub mod aggregator;
pub mod payout;
pub mod reconcile;
pub mod settlement;

pub use settlement::{Settlement, SettlementEngine, SettledWager, Totals};
