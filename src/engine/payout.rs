//! Payout calculation — the second settlement pass.
//!
//! Refunds return the net amount, losers get nothing, and winners get their
//! net amount back plus a share of the loser's pot proportional to
//! weight × net amount.

use num_rational::BigRational;
use num_traits::Zero;

use super::aggregator::{ClassifiedWager, Pots};
use crate::types::{Bucket, SettleError};

/// Final settlement amount for one classified wager, exact, in minor units.
///
/// `pots` must be the finalized totals from a completed aggregation of the
/// same batch.
pub fn payout(wager: &ClassifiedWager<'_>, pots: &Pots) -> Result<BigRational, SettleError> {
    match wager.bucket {
        Bucket::Refund => Ok(wager.net().clone()),
        Bucket::Lose => Ok(BigRational::zero()),
        Bucket::Win => {
            if pots.weighted_winner_pot.is_zero() {
                return Err(SettleError::InvalidState { winners: pots.winners });
            }
            let net = wager.net();
            let share = net * &wager.wager.weight / &pots.weighted_winner_pot;
            Ok(net + share * &pots.loser_pot)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
