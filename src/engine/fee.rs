//! Fee model.
//!
//! The house fee is a flat fraction of each wager's gross amount, fixed by
//! the calendar date the wager was placed. It is deducted up front and kept
//! whatever bucket the wager later lands in.

use chrono::NaiveDate;
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::types::Wager;

// ---------------------------------------------------------------------------
// Schedule (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// A rate that applies from `effective_from` (inclusive) onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeTier {
    pub effective_from: NaiveDate,
    pub rate: BigRational,
}

/// Date-dependent fee schedule.
///
/// `tiers` must be sorted by `effective_from`, strictly increasing. Dates
/// before the first tier pay `base_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    pub base_rate: BigRational,
    pub tiers: Vec<FeeTier>,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_rate: percent(1),
            tiers: vec![FeeTier {
                effective_from: NaiveDate::from_ymd_opt(2016, 8, 1).unwrap_or_default(),
                rate: percent(2),
            }],
        }
    }
}

fn percent(n: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(100))
}

impl FeeSchedule {
    /// Fee rate for a wager placed on `date`.
    ///
    /// Compared as calendar dates (year, then month, then day), never as
    /// raw text.
    pub fn rate_for(&self, date: NaiveDate) -> &BigRational {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.effective_from <= date)
            .map(|tier| &tier.rate)
            .unwrap_or(&self.base_rate)
    }

    /// Compute the rate, fee and net amount for a wager.
    pub fn assess(&self, wager: &Wager) -> FeeAssessment {
        let rate = self.rate_for(wager.date).clone();
        let gross = wager.gross();
        let fee = &rate * &gross;
        let net = gross - &fee;
        FeeAssessment { rate, fee, net }
    }
}

/// Fee rate under the default schedule: 2/100 from 1 August 2016, 1/100
/// before.
pub fn fee_rate(date: NaiveDate) -> BigRational {
    FeeSchedule::default().rate_for(date).clone()
}

/// Per-wager fee breakdown. All values exact, in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeAssessment {
    pub rate: BigRational,
    pub fee: BigRational,
    pub net: BigRational,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
