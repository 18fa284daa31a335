//! Wager ledger reader.
//!
//! Turns a pasted wager table into `Wager` records. One wager per line,
//! whitespace-separated columns:
//!
//! ```text
//! date      time   side    weight  amount  from  to   output
//! 15/08/16  14:02  Yes     99,999  1.0     1Ab…  1Cd… 2.86460379
//! 03/02/16  09:30  Refund  1000    10.0    1Ef…  1Gh… -
//! ```
//!
//! Amounts are in whole currency units; `output` is `-` when no settlement
//! has been published yet. Blank lines, `#` comments and a header row are
//! skipped. Identifiers are assigned 1-based in file order.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::money::{minor_units, ratio_from_decimal, to_minor_ratio};
use crate::types::Wager;

const COLUMNS: usize = 8;
const NO_OUTPUT: &str = "-";

/// Read and parse a ledger file.
pub fn read_ledger(path: impl AsRef<Path>, decimals: u32) -> Result<Vec<Wager>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
    let wagers = parse_ledger(&text, decimals)
        .with_context(|| format!("Failed to parse ledger: {}", path.display()))?;
    info!(path = %path.display(), wagers = wagers.len(), "Ledger loaded");
    Ok(wagers)
}

/// Parse ledger text. Any malformed row fails the whole parse.
pub fn parse_ledger(text: &str, decimals: u32) -> Result<Vec<Wager>> {
    let mut wagers = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = line.split_whitespace().collect();
        if is_header(&columns) {
            continue;
        }

        let id = u32::try_from(wagers.len() + 1).context("too many wagers")?;
        let wager = parse_row(id, &columns, decimals)
            .with_context(|| format!("line {}: {line}", index + 1))?;
        debug!(wager = %wager, "Parsed wager");
        wagers.push(wager);
    }

    Ok(wagers)
}

fn is_header(columns: &[&str]) -> bool {
    columns
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case("date"))
}

fn parse_row(id: u32, columns: &[&str], decimals: u32) -> Result<Wager> {
    if columns.len() != COLUMNS {
        bail!("expected {COLUMNS} columns, found {}", columns.len());
    }

    let date = parse_date(columns[0])?;
    let time = parse_time(columns[1])?;
    let side = columns[2];
    let weight = parse_weight(columns[3]).context("weight")?;
    if weight.is_sign_negative() && !weight.is_zero() {
        bail!("weight {weight} is negative");
    }
    let amount = parse_decimal(columns[4]).context("amount")?;
    let gross_amount = minor_units(amount, decimals).context("amount")?;

    let mut wager = Wager::new(id, date, side, ratio_from_decimal(weight), gross_amount)
        .with_time(time)
        .with_addresses(columns[5], columns[6]);

    if columns[7] != NO_OUTPUT {
        let output = parse_decimal(columns[7]).context("output")?;
        wager = wager.with_reported_output(to_minor_ratio(output, decimals));
    }

    Ok(wager)
}

/// `dd/mm/yy` or ISO `yyyy-mm-dd`. Two-digit years follow chrono's `%y`
/// pivot (00–68 → 20xx).
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%d/%m/%y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .map_err(|_| anyhow!("invalid date {text:?}, expected dd/mm/yy or yyyy-mm-dd"))
}

fn parse_time(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| anyhow!("invalid time {text:?}, expected hh:mm or hh:mm:ss"))
}

/// Weight, with optional `,` thousands separators.
fn parse_weight(text: &str) -> Result<Decimal> {
    parse_decimal(&text.replace(',', ""))
}

/// Plain decimal. Money columns never accept separators, so `1,5` is an
/// error rather than fifteen.
fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).map_err(|e| anyhow!("invalid number {text:?}: {e}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
