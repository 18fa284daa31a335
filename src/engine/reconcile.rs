//! Reconciliation against previously published settlements.
//!
//! Purely diagnostic: compares a computed payout to the amount that was
//! published for the same wager and never alters the computed value.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

use crate::money::pow10;
use crate::types::Verdict;

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    /// Largest accepted |computed − reported|, in minor units.
    pub tolerance: BigRational,
}

impl ReconcileConfig {
    /// Tolerance of `units` whole currency units.
    pub fn whole_units(units: BigRational, decimals: u32) -> Self {
        Self {
            tolerance: units * BigRational::from_integer(pow10(decimals)),
        }
    }
}

impl Default for ReconcileConfig {
    /// One whole BTC (10^8 satoshis).
    fn default() -> Self {
        Self::whole_units(BigRational::from_integer(BigInt::from(1)), 8)
    }
}

/// Outcome of a single reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub verdict: Verdict,
    /// computed − reported, when a reported amount exists.
    pub delta: Option<BigRational>,
}

pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Compare a computed payout to a published one.
    pub fn reconcile(&self, computed: &BigRational, reported: Option<&BigRational>) -> Reconciliation {
        reconcile(computed, reported, &self.config.tolerance)
    }
}

/// Compare a computed payout to a published one under `tolerance`
/// (inclusive).
pub fn reconcile(
    computed: &BigRational,
    reported: Option<&BigRational>,
    tolerance: &BigRational,
) -> Reconciliation {
    let Some(reported) = reported else {
        return Reconciliation { verdict: Verdict::Unresolved, delta: None };
    };
    let delta = computed - reported;
    let verdict = if &delta.abs() <= tolerance {
        Verdict::Ok
    } else {
        Verdict::Mismatch
    };
    Reconciliation { verdict, delta: Some(delta) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
