//! Property-based tests for the emission schedule and run tracker.
//!
//! Verifies:
//! - is_emission_point agrees with a brute-force decade oracle
//! - The predicate is history-free (pure in count and min_repetitions)
//! - Singles zone: every count <= min_repetitions is an emission point
//! - O(log N) bound: a run of N duplicates yields at most
//!   min_repetitions + 3 * (decades + 1) emissions
//! - next_milestone lands on an emission point and skips none
//! - RunTracker never reports a count twice and reports them increasing
//! - RunTracker invariant: last emitted count never exceeds the run count

use proptest::prelude::*;

use bundlelog_core::record::{Record, Severity};
use bundlelog_core::run_tracker::{Action, RunTracker};
use bundlelog_core::schedule::{is_emission_point, next_milestone};
use bundlelog_core::SuppressorConfig;

// ────────────────────────────────────────────────────────────────────
// Strategies & oracle
// ────────────────────────────────────────────────────────────────────

fn arb_min_repetitions() -> impl Strategy<Value = u32> {
    0u32..=1000
}

/// Brute-force oracle: is `count` of the form f * 10^n for f in {1, 2, 5}?
fn milestone_oracle(count: u64) -> bool {
    let mut decade = 1u64;
    loop {
        for factor in [1u64, 2, 5] {
            if let Some(candidate) = decade.checked_mul(factor) {
                if candidate == count {
                    return true;
                }
            }
        }
        match decade.checked_mul(10) {
            Some(next) if next <= count => decade = next,
            _ => return false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────
// Schedule properties
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Beyond the singles zone, the predicate matches the decade oracle.
    #[test]
    fn matches_oracle(count in 1u64..=u64::MAX, min_repetitions in arb_min_repetitions()) {
        let expected = count <= u64::from(min_repetitions) || milestone_oracle(count);
        prop_assert_eq!(is_emission_point(count, min_repetitions), expected);
    }

    /// History-free: recomputation gives the same answer.
    #[test]
    fn idempotent(count in 1u64..=u64::MAX, min_repetitions in arb_min_repetitions()) {
        prop_assert_eq!(
            is_emission_point(count, min_repetitions),
            is_emission_point(count, min_repetitions)
        );
    }

    /// Every count inside the singles zone is an emission point.
    #[test]
    fn singles_zone_always_emits(min_repetitions in 1u32..=1000) {
        for count in 1..=u64::from(min_repetitions) {
            prop_assert!(is_emission_point(count, min_repetitions));
        }
    }

    /// next_milestone lands on an emission point and skips none in between.
    #[test]
    fn next_milestone_is_tight(count in 1u64..=1_000_000u64) {
        let next = next_milestone(count);
        prop_assert!(next > count);
        prop_assert!(is_emission_point(next, 0));
        for between in (count + 1)..next {
            prop_assert!(!is_emission_point(between, 0));
        }
    }
}

// ────────────────────────────────────────────────────────────────────
// Emission-volume bound
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A run of N duplicates produces O(log N) emissions: the singles
    /// zone plus at most 3 milestones per decade.
    #[test]
    fn emission_count_is_logarithmic(
        n in 1u64..=20_000u64,
        min_repetitions in 0u32..=10,
    ) {
        let emissions = (1..=n)
            .filter(|&count| is_emission_point(count, min_repetitions))
            .count() as u64;
        let decades = n.ilog10() as u64 + 1;
        prop_assert!(emissions <= u64::from(min_repetitions) + 3 * decades);
    }
}

// ────────────────────────────────────────────────────────────────────
// RunTracker properties
// ────────────────────────────────────────────────────────────────────

fn tracker(min_repetitions: u32) -> RunTracker {
    RunTracker::new(&SuppressorConfig {
        min_repetitions,
        // Timerless: arming decisions are exercised elsewhere.
        max_delay_secs: 0.0,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Feeding N identical records reports each emitted count exactly
    /// once, in increasing order, and the tail count is recoverable by a
    /// run switch.
    #[test]
    fn reported_counts_increase_without_repeats(
        n in 1u64..=5_000u64,
        min_repetitions in 0u32..=10,
    ) {
        let mut t = tracker(min_repetitions);
        let rec = Record::new(Severity::Error, "p", "dup");
        let mut reported = Vec::new();
        for count in 1..=n {
            match t.observe(&rec, 0).action {
                Action::EmitOriginal => reported.push(count),
                Action::EmitBundle(_) => reported.push(count),
                Action::Suppress(_) => {}
                Action::FlushThenEmit(_) => prop_assert!(false, "no run switch fed"),
            }
        }
        let distinct = Record::new(Severity::Info, "p", "other");
        if let Action::FlushThenEmit(bundle) = t.observe(&distinct, 0).action {
            let tail: u64 = bundle
                .message
                .strip_prefix('[')
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|digits| digits.parse().ok())
                .unwrap_or(0);
            prop_assert_eq!(tail, n);
            reported.push(tail);
        }
        let mut sorted = reported.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(reported, sorted);
    }

    /// Interleaving two distinct messages never loses a dirty bundle:
    /// every switch away from a dirty run flushes exactly once.
    #[test]
    fn run_switches_flush_dirty_runs(switch_points in prop::collection::vec(1u64..=40, 1..10)) {
        let mut t = tracker(2);
        let a = Record::new(Severity::Error, "p", "aaa");
        let b = Record::new(Severity::Error, "p", "bbb");
        let mut current = &a;
        for &reps in &switch_points {
            let was_dirty_before_switch = {
                for _ in 0..reps {
                    t.observe(current, 0);
                }
                t.is_dirty()
            };
            current = if std::ptr::eq(current, &a) { &b } else { &a };
            let obs = t.observe(current, 0);
            match obs.action {
                Action::FlushThenEmit(_) => prop_assert!(was_dirty_before_switch),
                Action::EmitOriginal => prop_assert!(!was_dirty_before_switch),
                other => prop_assert!(false, "unexpected action {:?}", other),
            }
        }
    }
}
