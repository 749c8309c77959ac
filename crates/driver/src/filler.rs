//! The Filler Scheduler (spec §4.F): pure arithmetic over a timestamp gap,
//! kept separate from [`crate::proposer`] so the math (P8) is unit-testable
//! without an engine.

use crate::errors::ImporterError;

/// The number of filler L2 blocks needed to keep L2 block time at
/// `block_interval_secs` between `head_timestamp` and `new_timestamp`, and
/// each filler's timestamp.
///
/// `gap = new_timestamp - head_timestamp`. No fillers are needed for
/// `gap <= block_interval_secs`; otherwise `floor(gap / interval) - (gap %
/// interval == 0 ? 1 : 0)` fillers are inserted, each `interval` seconds
/// after the last (spec §4.F, P8).
pub fn filler_timestamps(
    head_timestamp: u64,
    new_timestamp: u64,
    block_interval_secs: u64,
    max_fillers: u64,
) -> Result<Vec<u64>, ImporterError> {
    let gap = new_timestamp.saturating_sub(head_timestamp);
    if gap <= block_interval_secs {
        return Ok(Vec::new());
    }

    let whole_intervals = gap / block_interval_secs;
    let needed = if gap % block_interval_secs == 0 { whole_intervals - 1 } else { whole_intervals };

    if needed > max_fillers {
        return Err(ImporterError::TooManyFillers { needed, cap: max_fillers });
    }

    Ok((1..=needed).map(|i| head_timestamp + i * block_interval_secs).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// P8: for `gap in {12, 13, 23, 24, 25}` the filler counts are
    /// `{0, 1, 1, 1, 2}`.
    #[test]
    fn p8_filler_math() {
        let cases = [(12, 0), (13, 1), (23, 1), (24, 1), (25, 2)];
        for (gap, expected_count) in cases {
            let fillers = filler_timestamps(1000, 1000 + gap, 12, 100).unwrap();
            assert_eq!(fillers.len(), expected_count, "gap={gap}");
        }
    }

    /// Scenario 5: head at 1000, new block at 1048 -> fillers at
    /// 1012, 1024, 1036.
    #[test]
    fn scenario_5_filler_insertion() {
        let fillers = filler_timestamps(1000, 1048, 12, 100).unwrap();
        assert_eq!(fillers, vec![1012, 1024, 1036]);
    }

    #[test]
    fn exact_multiple_of_interval_has_no_trailing_filler() {
        // gap=36 is 3 whole intervals; the real block lands on the third,
        // so only 2 fillers precede it.
        let fillers = filler_timestamps(1000, 1036, 12, 100).unwrap();
        assert_eq!(fillers, vec![1012, 1024]);
    }

    #[test]
    fn exceeding_the_cap_is_fatal() {
        let err = filler_timestamps(0, 12 * 200, 12, 100).unwrap_err();
        assert!(matches!(err, ImporterError::TooManyFillers { needed: 199, cap: 100 }));
    }

    #[test]
    fn zero_gap_needs_no_fillers() {
        assert!(filler_timestamps(1000, 1000, 12, 100).unwrap().is_empty());
    }
}
