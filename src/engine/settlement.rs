//! Settlement pipeline.
//!
//! Two stages with a typed hand-off: `aggregate` classifies every wager and
//! finalizes both pots, then the payout pass distributes the loser's pot
//! using those totals. Each run owns its pots; nothing carries over
//! between runs.

use num_rational::BigRational;
use num_traits::Zero;
use std::collections::HashMap;
use tracing::{info, warn};

use super::aggregator::{aggregate, Pots};
use super::fee::FeeSchedule;
use super::payout::payout;
use super::reconcile::{Reconciler, ReconcileConfig, Reconciliation};
use crate::types::{Bucket, Outcome, OutcomeLabels, SettleError, Verdict, Wager};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Everything computed for one wager.
#[derive(Debug, Clone)]
pub struct SettledWager<'a> {
    pub wager: &'a Wager,
    pub bucket: Bucket,
    pub fee_rate: BigRational,
    pub fee: BigRational,
    pub net_amount: BigRational,
    pub computed_output: BigRational,
    pub reconciliation: Reconciliation,
}

impl SettledWager<'_> {
    pub fn verdict(&self) -> Verdict {
        self.reconciliation.verdict
    }
}

/// Batch-level sums, exact, in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub gross: BigRational,
    pub fees: BigRational,
    pub paid_out: BigRational,
    /// Loser's pot left undistributed because nobody backed the declared
    /// outcome.
    pub undistributed: BigRational,
}

impl Totals {
    /// gross − fees − paid_out − undistributed. Zero for every valid run.
    pub fn residual(&self) -> BigRational {
        &self.gross - &self.fees - &self.paid_out - &self.undistributed
    }
}

/// A completed settlement run.
#[derive(Debug, Clone)]
pub struct Settlement<'a> {
    pub declared: Outcome,
    pub pots: Pots,
    pub wagers: Vec<SettledWager<'a>>,
    pub totals: Totals,
}

impl<'a> Settlement<'a> {
    /// Settled wagers in a given bucket, in input order.
    pub fn in_bucket(&self, bucket: Bucket) -> impl Iterator<Item = &SettledWager<'a>> {
        self.wagers.iter().filter(move |w| w.bucket == bucket)
    }

    /// Look up a settled wager by its identifier.
    pub fn get(&self, wager_id: u32) -> Option<&SettledWager<'a>> {
        self.wagers.iter().find(|w| w.wager.id == wager_id)
    }

    /// Number of wagers per reconciliation verdict.
    pub fn verdict_counts(&self) -> HashMap<Verdict, usize> {
        let mut counts = HashMap::new();
        for w in &self.wagers {
            *counts.entry(w.verdict()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every wager with a published amount reconciled.
    pub fn is_reconciled(&self) -> bool {
        self.wagers.iter().all(|w| w.verdict() != Verdict::Mismatch)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Settles batches of wagers under one set of labels, fees and tolerance.
pub struct SettlementEngine {
    labels: OutcomeLabels,
    fees: FeeSchedule,
    reconciler: Reconciler,
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new(
            OutcomeLabels::default(),
            FeeSchedule::default(),
            ReconcileConfig::default(),
        )
    }
}

impl SettlementEngine {
    pub fn new(labels: OutcomeLabels, fees: FeeSchedule, reconcile: ReconcileConfig) -> Self {
        Self {
            labels,
            fees,
            reconciler: Reconciler::new(reconcile),
        }
    }

    pub fn labels(&self) -> &OutcomeLabels {
        &self.labels
    }

    /// Settle a batch for a declared outcome given by label text.
    pub fn settle_label<'a>(
        &self,
        wagers: &'a [Wager],
        declared: &str,
    ) -> Result<Settlement<'a>, SettleError> {
        let outcome = self.labels.resolve(declared)?;
        self.settle(wagers, outcome)
    }

    /// Settle a batch for a declared outcome.
    ///
    /// All-or-nothing: any corrupt wager, a degenerate winner pot or a
    /// failed conservation audit aborts the run and no settlement is
    /// returned.
    pub fn settle<'a>(
        &self,
        wagers: &'a [Wager],
        declared: Outcome,
    ) -> Result<Settlement<'a>, SettleError> {
        // Stage 1: classify everything and finalize both pots.
        let aggregation = aggregate(wagers, declared, &self.labels, &self.fees)?;
        let pots = aggregation.pots;

        if pots.is_degenerate() {
            warn!(winners = pots.winners, "Winning wagers carry no weight");
            return Err(SettleError::InvalidState { winners: pots.winners });
        }

        // Stage 2: distribute.
        let mut settled = Vec::with_capacity(aggregation.wagers.len());
        let mut totals = Totals {
            gross: BigRational::zero(),
            fees: BigRational::zero(),
            paid_out: BigRational::zero(),
            undistributed: BigRational::zero(),
        };

        for classified in &aggregation.wagers {
            let computed_output = payout(classified, &pots)?;
            let wager = classified.wager;
            let reconciliation = self
                .reconciler
                .reconcile(&computed_output, wager.reported_output.as_ref());

            if reconciliation.verdict == Verdict::Mismatch {
                warn!(
                    wager_id = wager.id,
                    computed = %computed_output,
                    reported = ?wager.reported_output.as_ref().map(|r| r.to_string()),
                    "Payout does not match published settlement"
                );
            }

            totals.gross += wager.gross();
            totals.fees += &classified.fee.fee;
            totals.paid_out += &computed_output;

            settled.push(SettledWager {
                wager,
                bucket: classified.bucket,
                fee_rate: classified.fee.rate.clone(),
                fee: classified.fee.fee.clone(),
                net_amount: classified.fee.net.clone(),
                computed_output,
                reconciliation,
            });
        }

        if pots.winners == 0 && !pots.loser_pot.is_zero() {
            warn!(
                loser_pot = %pots.loser_pot,
                "No wager backed the declared outcome; loser's pot left undistributed"
            );
            totals.undistributed = pots.loser_pot.clone();
        }

        let residual = totals.residual();
        if !residual.is_zero() {
            return Err(SettleError::ConservationViolated {
                residual: residual.to_string(),
            });
        }

        let settlement = Settlement {
            declared,
            pots,
            wagers: settled,
            totals,
        };

        let counts = settlement.verdict_counts();
        info!(
            declared = self.labels.label(declared),
            wagers = settlement.wagers.len(),
            winners = settlement.pots.winners,
            losers = settlement.pots.losers,
            refunds = settlement.pots.refunds,
            loser_pot = %settlement.pots.loser_pot,
            weighted_winner_pot = %settlement.pots.weighted_winner_pot,
            ok = counts.get(&Verdict::Ok).copied().unwrap_or(0),
            mismatch = counts.get(&Verdict::Mismatch).copied().unwrap_or(0),
            unresolved = counts.get(&Verdict::Unresolved).copied().unwrap_or(0),
            "Settlement complete"
        );

        Ok(settlement)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
