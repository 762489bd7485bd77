//! Logarithmic emission-threshold schedule.
//!
//! Decides, for a repetition count, whether policy mandates producing
//! output. The first `min_repetitions` occurrences are always reported
//! (individually, not as bundles); beyond that, only counts landing on a
//! decade milestone — `10^n`, `2*10^n`, or `5*10^n` — are reported. For a
//! run of N duplicates this bounds reporting overhead to O(log N)
//! emissions while keeping small counts promptly visible.
//!
//! The predicate is pure and history-free: it depends only on
//! `(count, min_repetitions)`.

/// Upper bound accepted for `min_repetitions`.
///
/// Above this the always-report zone would swallow whole milestone decades;
/// the configuration boundary rejects such values instead of inheriting
/// unspecified behavior.
pub const MIN_REPETITIONS_MAX: u32 = 1000;

/// Whether `count` is an emission point under the given singles zone.
///
/// `count <= min_repetitions` is always an emission point (reported as a
/// single occurrence). Beyond the zone, `count` must equal `b`, `2b`, or
/// `5b` where `b` is the largest power of ten not exceeding `count`.
///
/// `count = 0` is unreachable in practice (counting starts at 1).
#[must_use]
pub fn is_emission_point(count: u64, min_repetitions: u32) -> bool {
    debug_assert!(count >= 1, "repetition counts start at 1");
    if count <= u64::from(min_repetitions) {
        return true;
    }
    // Integer decade: b = 10^floor(log10(count)). Exact for all u64,
    // unlike the float log10 route which misclassifies near 10^15.
    // Checked math: 2b and 5b overflow for the top decade (b = 10^19).
    let base = decade_base(count);
    count == base
        || Some(count) == base.checked_mul(2)
        || Some(count) == base.checked_mul(5)
}

/// Largest power of ten not exceeding `count` (`count >= 1`).
fn decade_base(count: u64) -> u64 {
    let mut base = 1u64;
    while base <= count / 10 {
        base *= 10;
    }
    base
}

/// The milestone sequence itself: 1, 2, 5, 10, 20, 50, 100, ...
///
/// Returns the smallest emission point strictly greater than `count`
/// (ignoring the singles zone). Saturates at `u64::MAX` once the next
/// milestone would overflow.
#[must_use]
pub fn next_milestone(count: u64) -> u64 {
    let base = decade_base(count);
    for factor in [1u64, 2, 5, 10] {
        match base.checked_mul(factor) {
            Some(candidate) if candidate > count => return candidate,
            Some(_) => {}
            None => return u64::MAX,
        }
    }
    u64::MAX
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- Emission points --------------------------------------------------------

    #[test]
    fn default_zone_table() {
        // min_repetitions = 5: singles at 1..=5, then decade milestones.
        let expected = [
            1u64, 2, 3, 4, 5, 10, 20, 50, 100, 200, 500, 1000, 2000, 5000,
        ];
        for count in 1..=6000u64 {
            let hit = is_emission_point(count, 5);
            assert_eq!(
                hit,
                expected.contains(&count),
                "count {count} misclassified"
            );
        }
    }

    #[test]
    fn milestones_without_singles_zone() {
        // min_repetitions = 0: every count goes through the log schedule.
        assert!(is_emission_point(1, 0)); // 10^0
        assert!(is_emission_point(2, 0));
        assert!(!is_emission_point(3, 0));
        assert!(!is_emission_point(4, 0));
        assert!(is_emission_point(5, 0));
        assert!(!is_emission_point(6, 0));
        assert!(is_emission_point(10, 0));
    }

    #[test]
    fn singles_zone_extends_reporting() {
        // min_repetitions = 8: counts 6..=8 are emission points that the
        // bare schedule would skip.
        for count in 1..=8u64 {
            assert!(is_emission_point(count, 8));
        }
        assert!(!is_emission_point(9, 8));
        assert!(is_emission_point(10, 8));
    }

    #[test]
    fn large_decades_are_exact() {
        assert!(is_emission_point(1_000_000_000_000_000, 5));
        assert!(is_emission_point(2_000_000_000_000_000, 5));
        assert!(is_emission_point(5_000_000_000_000_000, 5));
        assert!(!is_emission_point(1_000_000_000_000_001, 5));
        assert!(!is_emission_point(3_000_000_000_000_000, 5));
    }

    #[test]
    fn predicate_is_idempotent() {
        for count in [1u64, 6, 10, 19, 20, 21, 500, 501] {
            assert_eq!(
                is_emission_point(count, 5),
                is_emission_point(count, 5)
            );
        }
    }

    // -- next_milestone ---------------------------------------------------------

    #[test]
    fn next_milestone_sequence() {
        let mut count = 1u64;
        let seq: Vec<u64> = std::iter::from_fn(|| {
            count = next_milestone(count);
            Some(count)
        })
        .take(8)
        .collect();
        assert_eq!(seq, vec![2, 5, 10, 20, 50, 100, 200, 500]);
    }

    #[test]
    fn next_milestone_from_between() {
        assert_eq!(next_milestone(6), 10);
        assert_eq!(next_milestone(21), 50);
        assert_eq!(next_milestone(999), 1000);
    }

    #[test]
    fn next_milestone_saturates() {
        assert_eq!(next_milestone(u64::MAX), u64::MAX);
    }
}
