//! Settlement report rendering.
//!
//! This is where exact rationals finally become decimal text: each payout
//! is truncated toward zero to a whole number of minor units, once. The
//! difference between the exact total and the truncated total is reported
//! as rounding dust.

use anyhow::{Context, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use serde::Serialize;
use std::fmt::Write as _;

use crate::config::CurrencyConfig;
use crate::engine::{Settlement, SettledWager};
use crate::money::{format_minor, format_ratio, pow10, truncate_to_minor};
use crate::types::{Bucket, OutcomeLabels, Verdict};

/// Fractional digits used for weights and fee percentages.
const DISPLAY_PLACES: u32 = 2;

// ---------------------------------------------------------------------------
// Report model
// ---------------------------------------------------------------------------

/// One rendered wager. All amounts are decimal strings in whole units.
#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub id: u32,
    pub date: String,
    pub time: Option<String>,
    pub side: String,
    pub weight: String,
    pub amount: String,
    pub bucket: Bucket,
    pub fee_pct: String,
    pub fee: String,
    pub net: String,
    pub payout: String,
    /// Payout in minor units, truncated toward zero.
    pub payout_minor: String,
    pub reported: Option<String>,
    pub verdict: Verdict,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTotals {
    pub gross: String,
    pub fees: String,
    pub loser_pot: String,
    pub weighted_winner_pot: String,
    pub paid_out: String,
    pub undistributed: String,
    /// Exact payouts minus truncated payouts.
    pub rounding_dust: String,
    pub winners: usize,
    pub losers: usize,
    pub refunds: usize,
    pub ok: usize,
    pub mismatch: usize,
    pub unresolved: usize,
}

/// Serializable view of a settlement run.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub declared: String,
    pub currency: String,
    pub wagers: Vec<ReportLine>,
    pub totals: ReportTotals,
}

impl SettlementReport {
    pub fn build(settlement: &Settlement<'_>, labels: &OutcomeLabels, currency: &CurrencyConfig) -> Self {
        let decimals = currency.decimals;
        let unit = BigRational::from_integer(pow10(decimals));
        let whole = |minor: &BigRational| format_ratio(&(minor / &unit), decimals);

        let mut truncated_total = BigInt::zero();
        let wagers = settlement
            .wagers
            .iter()
            .map(|w| {
                let line = report_line(w, decimals, &whole);
                truncated_total += truncate_to_minor(&w.computed_output);
                line
            })
            .collect();

        let dust = &settlement.totals.paid_out - BigRational::from_integer(truncated_total.clone());
        let counts = settlement.verdict_counts();
        let pots = &settlement.pots;

        let totals = ReportTotals {
            gross: whole(&settlement.totals.gross),
            fees: whole(&settlement.totals.fees),
            loser_pot: whole(&pots.loser_pot),
            weighted_winner_pot: whole(&pots.weighted_winner_pot),
            paid_out: format_minor(&truncated_total, decimals),
            undistributed: whole(&settlement.totals.undistributed),
            rounding_dust: whole(&dust),
            winners: pots.winners,
            losers: pots.losers,
            refunds: pots.refunds,
            ok: counts.get(&Verdict::Ok).copied().unwrap_or(0),
            mismatch: counts.get(&Verdict::Mismatch).copied().unwrap_or(0),
            unresolved: counts.get(&Verdict::Unresolved).copied().unwrap_or(0),
        };

        Self {
            declared: labels.label(settlement.declared).to_string(),
            currency: currency.symbol.clone(),
            wagers,
            totals,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialise settlement report")
    }

    /// Column-aligned text table followed by a totals block.
    pub fn render_text(&self) -> String {
        let header = [
            "#", "Date", "Side", "Weight", "Amount", "Bucket", "Fee", "Net", "Payout", "Reported",
            "Check",
        ];
        let rows: Vec<[String; 11]> = self
            .wagers
            .iter()
            .map(|l| {
                [
                    l.id.to_string(),
                    l.date.clone(),
                    l.side.clone(),
                    l.weight.clone(),
                    l.amount.clone(),
                    l.bucket.to_string(),
                    l.fee_pct.clone(),
                    l.net.clone(),
                    l.payout.clone(),
                    l.reported.clone().unwrap_or_else(|| "-".to_string()),
                    l.verdict.to_string(),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.len());
            }
        }

        // Text columns left-aligned, numbers right-aligned.
        let left = [false, true, true, false, false, true, false, false, false, false, true];
        let mut out = String::new();
        let mut push_row = |cells: &[&str]| {
            let line: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    if left[i] {
                        format!("{c:<w$}", w = widths[i])
                    } else {
                        format!("{c:>w$}", w = widths[i])
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        };

        push_row(&header);
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            push_row(&cells);
        }

        let t = &self.totals;
        let sym = &self.currency;
        let _ = writeln!(out);
        let _ = writeln!(out, "Declared outcome:     {}", self.declared);
        let _ = writeln!(out, "Total wagered:        {} {sym}", t.gross);
        let _ = writeln!(out, "Fees collected:       {} {sym}", t.fees);
        let _ = writeln!(out, "Loser's pot:          {} {sym}", t.loser_pot);
        let _ = writeln!(out, "Weighted pot:         {}", t.weighted_winner_pot);
        let _ = writeln!(out, "Paid out:             {} {sym}", t.paid_out);
        if !is_zero_text(&t.undistributed) {
            let _ = writeln!(out, "Undistributed:        {} {sym}", t.undistributed);
        }
        let _ = writeln!(out, "Rounding dust:        {} {sym}", t.rounding_dust);
        let _ = writeln!(
            out,
            "Wagers:               {} win / {} lose / {} refund",
            t.winners, t.losers, t.refunds
        );
        let _ = writeln!(
            out,
            "Reconciliation:       {} ok / {} mismatch / {} unresolved",
            t.ok, t.mismatch, t.unresolved
        );
        out
    }
}

fn is_zero_text(text: &str) -> bool {
    text.chars().all(|c| c == '0' || c == '.' || c == '-')
}

fn report_line(
    w: &SettledWager<'_>,
    decimals: u32,
    whole: &impl Fn(&BigRational) -> String,
) -> ReportLine {
    let wager = w.wager;
    let payout_minor = truncate_to_minor(&w.computed_output);
    let hundred = BigRational::from_integer(BigInt::from(100));

    ReportLine {
        id: wager.id,
        date: wager.date.format("%Y-%m-%d").to_string(),
        time: wager.time.map(|t| t.format("%H:%M:%S").to_string()),
        side: wager.side.clone(),
        weight: if wager.weight.is_integer() {
            wager.weight.to_integer().to_string()
        } else {
            format_ratio(&wager.weight, DISPLAY_PLACES)
        },
        amount: format_minor(&BigInt::from(wager.gross_amount), decimals),
        bucket: w.bucket,
        fee_pct: format!("{}%", format_ratio(&(&w.fee_rate * &hundred), DISPLAY_PLACES)),
        fee: whole(&w.fee),
        net: whole(&w.net_amount),
        payout: format_minor(&payout_minor, decimals),
        payout_minor: payout_minor.to_string(),
        reported: wager.reported_output.as_ref().map(|r| whole(r)),
        verdict: w.verdict(),
        from: wager.from.clone(),
        to: wager.to.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
