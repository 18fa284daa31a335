//! End-to-end settlement properties.
//!
//! Runs whole batches through `SettlementEngine` and checks the worked
//! example, conservation, determinism, outcome symmetry and the fatal
//! error paths.

use chrono::NaiveDate;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use parimutuel::engine::fee::fee_rate;
use parimutuel::engine::SettlementEngine;
use parimutuel::money::truncate_to_minor;
use parimutuel::types::{Bucket, Outcome, SettleError, Verdict, Wager};

const SATS: u64 = 100_000_000;

fn int(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

fn ratio(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Mary 1.0 @ 99999 Yes, John 2.0 @ 80000 Yes, Alex 5.0 @ 60000 No,
/// Bob 10.0 @ 1000 Refund, all at the 2% rate.
fn worked_example() -> Vec<Wager> {
    let d = date(2016, 9, 1);
    vec![
        Wager::new(1, d, "Yes", int(99_999), SATS).with_addresses("Mary", "house"),
        Wager::new(2, d, "Yes", int(80_000), 2 * SATS).with_addresses("John", "house"),
        Wager::new(3, d, "No", int(60_000), 5 * SATS).with_addresses("Alex", "house"),
        Wager::new(4, d, "Refund", int(1_000), 10 * SATS).with_addresses("Bob", "house"),
    ]
}

/// A mixed batch spanning both fee rates, odd amounts and fractional weights.
fn mixed_batch() -> Vec<Wager> {
    vec![
        Wager::new(1, date(2016, 7, 31), "Yes", ratio(7, 3), 123_456_789),
        Wager::new(2, date(2016, 8, 1), "No", ratio(1, 2), 1),
        Wager::new(3, date(2015, 2, 14), "Refund", int(3), 999),
        Wager::new(4, date(2017, 11, 30), "No", int(0), 50_000_001),
        Wager::new(5, date(2014, 6, 6), "Yes", ratio(22, 7), 77_777),
        Wager::new(6, date(2016, 12, 1), "No", int(12), 3_141_592_653),
        Wager::new(7, date(2016, 8, 15), "Refund", int(1), 17),
        Wager::new(8, date(2016, 1, 1), "Yes", int(0), 2_000),
    ]
}

fn assert_conserves(wagers: &[Wager], declared: Outcome) {
    let s = SettlementEngine::default().settle(wagers, declared).unwrap();
    let gross: BigRational = wagers.iter().map(Wager::gross).fold(BigRational::zero(), |a, b| a + b);
    let fees = s.wagers.iter().fold(BigRational::zero(), |a, w| a + &w.fee);
    let out = s
        .wagers
        .iter()
        .fold(BigRational::zero(), |a, w| a + &w.computed_output);
    assert_eq!(out + fees + &s.totals.undistributed, gross);
    assert!(s.totals.residual().is_zero());
}

#[test]
fn test_worked_example_pots() {
    let wagers = worked_example();
    let s = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();

    // 4.90 BTC and 254799.02 (weight × BTC), in minor units.
    assert_eq!(s.pots.loser_pot, int(490_000_000));
    assert_eq!(s.pots.weighted_winner_pot, int(25_479_902_000_000));
    assert_eq!(s.pots.winners, 2);
    assert_eq!(s.pots.losers, 1);
    assert_eq!(s.pots.refunds, 1);
}

#[test]
fn test_worked_example_payouts() {
    let wagers = worked_example();
    let s = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();

    let mary = s.get(1).unwrap();
    let john = s.get(2).unwrap();
    let alex = s.get(3).unwrap();
    let bob = s.get(4).unwrap();

    assert_eq!(mary.bucket, Bucket::Win);
    assert_eq!(mary.fee_rate, ratio(2, 100));
    assert_eq!(mary.computed_output, ratio(74_479_412_000_000, 259_999));
    assert_eq!(john.computed_output, ratio(129_359_804_000_000, 259_999));
    assert_eq!(alex.computed_output, int(0));
    assert_eq!(bob.computed_output, int(980_000_000));

    // ≈ 2.86460378… and 4.97539621… BTC.
    assert_eq!(truncate_to_minor(&mary.computed_output), BigInt::from(286_460_378));
    assert_eq!(truncate_to_minor(&john.computed_output), BigInt::from(497_539_621));

    // Winners split exactly their own nets plus the loser's pot.
    assert_eq!(
        &mary.computed_output + &john.computed_output,
        int(98_000_000 + 196_000_000 + 490_000_000)
    );
}

#[test]
fn test_worked_example_reconciliation() {
    let mut wagers = worked_example();
    wagers[0] = wagers[0].clone().with_reported_output(int(286_460_379));
    wagers[2] = wagers[2].clone().with_reported_output(int(2 * SATS as i64));

    let s = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();
    assert_eq!(s.get(1).unwrap().verdict(), Verdict::Ok);
    assert_eq!(s.get(2).unwrap().verdict(), Verdict::Unresolved);
    assert_eq!(s.get(3).unwrap().verdict(), Verdict::Mismatch);
    // Reconciliation never alters the payout.
    assert_eq!(s.get(3).unwrap().computed_output, int(0));
}

#[test]
fn test_conservation() {
    assert_conserves(&worked_example(), Outcome::A);
    assert_conserves(&worked_example(), Outcome::B);
    assert_conserves(&mixed_batch(), Outcome::A);
    assert_conserves(&mixed_batch(), Outcome::B);
}

#[test]
fn test_idempotent() {
    let wagers = mixed_batch();
    let engine = SettlementEngine::default();
    let first = engine.settle(&wagers, Outcome::B).unwrap();
    let second = engine.settle(&wagers, Outcome::B).unwrap();

    assert_eq!(first.pots, second.pots);
    for (a, b) in first.wagers.iter().zip(second.wagers.iter()) {
        assert_eq!(a.bucket, b.bucket);
        assert_eq!(a.computed_output, b.computed_output);
    }
}

#[test]
fn test_swapping_outcome_swaps_buckets() {
    let wagers = mixed_batch();
    let engine = SettlementEngine::default();
    let a = engine.settle(&wagers, Outcome::A).unwrap();
    let b = engine.settle(&wagers, Outcome::B).unwrap();

    for (x, y) in a.wagers.iter().zip(b.wagers.iter()) {
        match x.bucket {
            Bucket::Refund => {
                assert_eq!(y.bucket, Bucket::Refund);
                assert_eq!(x.computed_output, y.computed_output);
            }
            Bucket::Win => assert_eq!(y.bucket, Bucket::Lose),
            Bucket::Lose => assert_eq!(y.bucket, Bucket::Win),
        }
        assert_eq!(x.net_amount, y.net_amount);
    }
    assert_eq!(a.pots.winners, b.pots.losers);
    assert_eq!(a.pots.losers, b.pots.winners);
}

#[test]
fn test_labels_are_symmetric_under_swap() {
    // Swapping the label text and the declared outcome together changes nothing.
    use parimutuel::engine::fee::FeeSchedule;
    use parimutuel::engine::reconcile::ReconcileConfig;
    use parimutuel::types::OutcomeLabels;

    let wagers = mixed_batch();
    let straight = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();
    let swapped_engine = SettlementEngine::new(
        OutcomeLabels::new("No", "Yes", "Refund"),
        FeeSchedule::default(),
        ReconcileConfig::default(),
    );
    let swapped = swapped_engine.settle(&wagers, Outcome::B).unwrap();

    for (x, y) in straight.wagers.iter().zip(swapped.wagers.iter()) {
        assert_eq!(x.bucket, y.bucket);
        assert_eq!(x.computed_output, y.computed_output);
    }
}

#[test]
fn test_fee_rate_boundary() {
    assert_eq!(fee_rate(date(2016, 7, 31)), ratio(1, 100));
    assert_eq!(fee_rate(date(2016, 8, 1)), ratio(2, 100));

    let wagers = mixed_batch();
    let s = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();
    assert_eq!(s.get(1).unwrap().fee_rate, ratio(1, 100));
    assert_eq!(s.get(2).unwrap().fee_rate, ratio(2, 100));
    // Fee is kept even on refunds.
    let refund = s.get(3).unwrap();
    assert_eq!(refund.fee, ratio(999, 100));
    assert_eq!(refund.computed_output, ratio(999 * 99, 100));
}

#[test]
fn test_zero_weight_winner_alongside_others() {
    let wagers = mixed_batch();
    let s = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap();
    let zero_weight = s.get(8).unwrap();
    assert_eq!(zero_weight.bucket, Bucket::Win);
    assert_eq!(zero_weight.computed_output, zero_weight.net_amount);
}

#[test]
fn test_zero_winner_pot_fails() {
    let d = date(2016, 9, 1);
    let wagers = vec![
        Wager::new(1, d, "Yes", int(0), SATS),
        Wager::new(2, d, "Yes", int(0), SATS),
        Wager::new(3, d, "No", int(5), SATS),
    ];
    let err = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap_err();
    assert_eq!(err, SettleError::InvalidState { winners: 2 });
}

#[test]
fn test_corrupt_side_fails_whole_batch() {
    let mut wagers = worked_example();
    wagers.push(Wager::new(5, date(2016, 9, 1), "yes", int(1), SATS));

    let err = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap_err();
    assert_eq!(
        err,
        SettleError::CorruptInput { wager_id: 5, side: "yes".to_string() }
    );
}

#[test]
fn test_duplicate_ids_fail_whole_batch() {
    let d = date(2016, 9, 1);
    let wagers = vec![
        Wager::new(1, d, "Yes", int(1), SATS),
        Wager::new(1, d, "No", int(1), SATS),
    ];
    let err = SettlementEngine::default().settle(&wagers, Outcome::A).unwrap_err();
    assert_eq!(err, SettleError::DuplicateWager { wager_id: 1 });
}
