//! # Group set statistics
//!
//! Summary figures over a set of [`TelemetryGroup`]s, used for debug logging and for the
//! layer summaries exposed by [`Telemap`](crate::telemap::Telemap).
use std::fmt;

use super::TelemetryGroup;

/// Distribution of the number of fixes per group.
///
/// Quantiles use the nearest-rank rule on the sorted counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixCountStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for FixCountStats {
    /// Compact by default; multi-line with the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Fix count per group")?;
            writeln!(f, "-------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

pub trait GroupSetExt {
    /// Total number of fixes across all groups.
    fn total_fixes(&self) -> usize;

    /// Number of groups in the set.
    fn number_of_groups(&self) -> usize;

    /// Distribution of fix counts per group.
    ///
    /// Return
    /// ----------
    /// * `None` for an empty set.
    /// * `Some(FixCountStats)` otherwise.
    ///
    /// See also
    /// ------------
    /// * [`total_fixes`](GroupSetExt::total_fixes) – Sum of all fixes.
    fn fix_count_stats(&self) -> Option<FixCountStats>;
}

impl GroupSetExt for [TelemetryGroup] {
    fn total_fixes(&self) -> usize {
        self.iter().map(|g| g.count).sum()
    }

    fn number_of_groups(&self) -> usize {
        self.len()
    }

    fn fix_count_stats(&self) -> Option<FixCountStats> {
        let mut counts: Vec<usize> = self.iter().map(|g| g.count).collect();
        if counts.is_empty() {
            return None;
        }
        counts.sort_unstable();

        fn q_index(n: usize, q: f64) -> usize {
            let pos = q * (n as f64 - 1.0);
            (pos.round() as usize).min(n - 1)
        }

        let n = counts.len();
        Some(FixCountStats {
            min: counts[0],
            p25: counts[q_index(n, 0.25)],
            median: counts[q_index(n, 0.50)],
            p95: counts[q_index(n, 0.95)],
            max: counts[n - 1],
        })
    }
}

#[cfg(test)]
mod stats_test {
    use super::*;
    use crate::features::PropertyKey;
    use crate::grouping::group;
    use crate::grouping::grouping_test::fix;

    #[test]
    fn test_group_stats() {
        let mut points = Vec::new();
        for (animal, n) in [("A1", 1u64), ("A2", 3), ("A3", 5), ("A4", 7)] {
            for i in 0..n {
                points.push(fix(points.len() as u64, animal, -1.0 - i as f64, "2021-01-01"));
            }
        }
        let groups = group(&points, None, &PropertyKey::AnimalId);

        assert_eq!(groups.total_fixes(), 16);
        assert_eq!(groups.number_of_groups(), 4);

        let stats = groups.fix_count_stats().unwrap();
        assert_eq!(
            stats,
            FixCountStats {
                min: 1,
                p25: 3,
                median: 5,
                p95: 7,
                max: 7
            }
        );
        assert_eq!(stats.to_string(), "min=1, p25=3, median=5, p95=7, max=7");
        assert!(format!("{stats:#}").starts_with("Fix count per group"));
    }

    #[test]
    fn test_empty_stats() {
        let groups: Vec<TelemetryGroup> = Vec::new();
        assert!(groups.fix_count_stats().is_none());
        assert_eq!(groups.total_fixes(), 0);
    }
}
