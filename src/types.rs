//! Shared types for the settlement engine.
//!
//! These types form the data model used across the engine, the ledger
//! reader and the report renderer. Monetary quantities inside the engine
//! are exact rationals counted in minor currency units (satoshis for BTC);
//! conversion to and from decimal text happens only at the edges.

use chrono::{NaiveDate, NaiveTime};
use num_rational::BigRational;
use num_traits::Signed;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// One of the two outcomes of a binary event.
///
/// The engine never interprets outcome text; it only compares each wager's
/// side label against the labels configured for `A` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    A,
    B,
}

impl Outcome {
    /// The opposite outcome.
    pub fn opposite(&self) -> Self {
        match self {
            Outcome::A => Outcome::B,
            Outcome::B => Outcome::A,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::A => write!(f, "A"),
            Outcome::B => write!(f, "B"),
        }
    }
}

/// Label text for both outcomes and for the house refund marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLabels {
    pub a: String,
    pub b: String,
    pub refund: String,
}

impl Default for OutcomeLabels {
    fn default() -> Self {
        Self {
            a: "Yes".to_string(),
            b: "No".to_string(),
            refund: "Refund".to_string(),
        }
    }
}

impl OutcomeLabels {
    pub fn new(a: impl Into<String>, b: impl Into<String>, refund: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            refund: refund.into(),
        }
    }

    /// Label text for an outcome.
    pub fn label(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::A => &self.a,
            Outcome::B => &self.b,
        }
    }

    /// Map a side label to an outcome. Exact, case-sensitive comparison.
    pub fn outcome_of(&self, side: &str) -> Option<Outcome> {
        if side == self.a {
            Some(Outcome::A)
        } else if side == self.b {
            Some(Outcome::B)
        } else {
            None
        }
    }

    /// Whether a side label is the refund marker.
    pub fn is_refund(&self, side: &str) -> bool {
        side == self.refund
    }

    /// Resolve a declared-outcome label into an `Outcome`.
    pub fn resolve(&self, label: &str) -> Result<Outcome, SettleError> {
        self.outcome_of(label)
            .ok_or_else(|| SettleError::UnknownOutcome(label.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Wager
// ---------------------------------------------------------------------------

/// A single bet record. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Wager {
    /// 1-based sequence number in file order.
    pub id: u32,
    pub date: NaiveDate,
    /// Time of day the wager was placed. Carried through, never used in
    /// settlement arithmetic.
    pub time: Option<NaiveTime>,
    /// Raw side label as recorded.
    pub side: String,
    /// Payout weighting within the side. Non-negative.
    pub weight: BigRational,
    /// Wagered amount in minor currency units.
    pub gross_amount: u64,
    /// Previously published settlement amount, in minor units.
    pub reported_output: Option<BigRational>,
    pub from: String,
    pub to: String,
}

impl Wager {
    pub fn new(
        id: u32,
        date: NaiveDate,
        side: impl Into<String>,
        weight: BigRational,
        gross_amount: u64,
    ) -> Self {
        Self {
            id,
            date,
            time: None,
            side: side.into(),
            weight,
            gross_amount,
            reported_output: None,
            from: String::new(),
            to: String::new(),
        }
    }

    /// Attach a previously published settlement amount (minor units).
    pub fn with_reported_output(mut self, output: BigRational) -> Self {
        self.reported_output = Some(output);
        self
    }

    /// Attach address labels.
    pub fn with_addresses(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = from.into();
        self.to = to.into();
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Gross amount as an exact rational.
    pub fn gross(&self) -> BigRational {
        BigRational::from_integer(self.gross_amount.into())
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} weight={} amount={}",
            self.id,
            self.date.format("%Y-%m-%d"),
            self.side,
            self.weight,
            self.gross_amount,
        )
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classification of a wager relative to the declared outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Refund,
    Lose,
    Win,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Refund => write!(f, "Refund"),
            Bucket::Lose => write!(f, "Lose"),
            Bucket::Win => write!(f, "Win"),
        }
    }
}

/// Result of checking a computed payout against a published one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// No published amount to compare against.
    Unresolved,
    Ok,
    Mismatch,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Unresolved => write!(f, "??"),
            Verdict::Ok => write!(f, "OK"),
            Verdict::Mismatch => write!(f, "MISMATCH"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Fatal settlement errors. Any of these aborts the whole run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettleError {
    #[error("Corrupt input: wager #{wager_id} has side {side:?}, expected one of the outcome labels or the refund marker")]
    CorruptInput { wager_id: u32, side: String },

    #[error("Invalid state: {winners} winning wager(s) but the weighted winner's pot is zero (division by zero)")]
    InvalidState { winners: usize },

    #[error("Corrupt input: wager #{wager_id} appears more than once")]
    DuplicateWager { wager_id: u32 },

    #[error("Unknown outcome label: {0:?}")]
    UnknownOutcome(String),

    #[error("Negative weight on wager #{wager_id}: {weight}")]
    NegativeWeight { wager_id: u32, weight: String },

    #[error("Conservation violated: gross - fees - payouts - undistributed = {residual}")]
    ConservationViolated { residual: String },
}

impl SettleError {
    pub(crate) fn negative_weight(wager: &Wager) -> Option<Self> {
        if wager.weight.is_negative() {
            Some(SettleError::NegativeWeight {
                wager_id: wager.id,
                weight: wager.weight.to_string(),
            })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
