//! Pot aggregation — the first settlement pass.
//!
//! Visits every wager exactly once, assesses its fee, assigns it a bucket
//! relative to the declared outcome, and totals the two pots the payout
//! pass depends on. Nothing is paid out until this pass has finished for
//! the whole batch.

use num_rational::BigRational;
use num_traits::Zero;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::fee::{FeeAssessment, FeeSchedule};
use crate::types::{Bucket, Outcome, OutcomeLabels, SettleError, Wager};

// ---------------------------------------------------------------------------
// Pots
// ---------------------------------------------------------------------------

/// Final pot totals for one settlement run, in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct Pots {
    /// Sum of net amounts over Lose-bucket wagers.
    pub loser_pot: BigRational,
    /// Sum of weight × net amount over Win-bucket wagers.
    pub weighted_winner_pot: BigRational,
    pub winners: usize,
    pub losers: usize,
    pub refunds: usize,
}

impl Default for Pots {
    fn default() -> Self {
        Self {
            loser_pot: BigRational::zero(),
            weighted_winner_pot: BigRational::zero(),
            winners: 0,
            losers: 0,
            refunds: 0,
        }
    }
}

impl Pots {
    fn add(&mut self, bucket: Bucket, wager: &Wager, net: &BigRational) {
        match bucket {
            Bucket::Refund => self.refunds += 1,
            Bucket::Lose => {
                self.losers += 1;
                self.loser_pot += net;
            }
            Bucket::Win => {
                self.winners += 1;
                self.weighted_winner_pot += &wager.weight * net;
            }
        }
    }

    /// Whether winning wagers exist but can share nothing.
    pub fn is_degenerate(&self) -> bool {
        self.winners > 0 && self.weighted_winner_pot.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Bucket for a side label under a declared outcome. `None` means the label
/// is neither outcome nor the refund marker.
pub fn classify(side: &str, declared: Outcome, labels: &OutcomeLabels) -> Option<Bucket> {
    if labels.is_refund(side) {
        return Some(Bucket::Refund);
    }
    match labels.outcome_of(side)? {
        backed if backed == declared => Some(Bucket::Win),
        backed if backed == declared.opposite() => Some(Bucket::Lose),
        _ => None,
    }
}

/// A wager annotated by the first pass. Fee and bucket are fixed here and
/// reused verbatim by the payout pass.
#[derive(Debug, Clone)]
pub struct ClassifiedWager<'a> {
    pub wager: &'a Wager,
    pub bucket: Bucket,
    pub fee: FeeAssessment,
}

impl ClassifiedWager<'_> {
    pub fn net(&self) -> &BigRational {
        &self.fee.net
    }
}

/// Output of the first pass.
#[derive(Debug, Clone)]
pub struct Aggregation<'a> {
    pub wagers: Vec<ClassifiedWager<'a>>,
    pub pots: Pots,
}

/// Run the first pass over a batch.
///
/// Fails on the first wager whose side is not a known label or whose id was
/// already seen; no partial aggregation is returned.
pub fn aggregate<'a>(
    wagers: &'a [Wager],
    declared: Outcome,
    labels: &OutcomeLabels,
    fees: &FeeSchedule,
) -> Result<Aggregation<'a>, SettleError> {
    let mut pots = Pots::default();
    let mut classified = Vec::with_capacity(wagers.len());
    let mut seen = HashSet::with_capacity(wagers.len());

    for wager in wagers {
        if !seen.insert(wager.id) {
            warn!(wager_id = wager.id, "Duplicate wager id");
            return Err(SettleError::DuplicateWager { wager_id: wager.id });
        }

        if let Some(err) = SettleError::negative_weight(wager) {
            warn!(wager_id = wager.id, weight = %wager.weight, "Negative weight");
            return Err(err);
        }

        let Some(bucket) = classify(&wager.side, declared, labels) else {
            warn!(wager_id = wager.id, side = %wager.side, "Unrecognised side label");
            return Err(SettleError::CorruptInput {
                wager_id: wager.id,
                side: wager.side.clone(),
            });
        };

        let fee = fees.assess(wager);
        pots.add(bucket, wager, &fee.net);

        debug!(
            wager_id = wager.id,
            side = %wager.side,
            bucket = %bucket,
            rate = %fee.rate,
            net = %fee.net,
            "Wager classified"
        );

        classified.push(ClassifiedWager { wager, bucket, fee });
    }

    Ok(Aggregation { wagers: classified, pots })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
