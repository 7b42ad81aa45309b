//! Batch run report

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Counters for one batch fix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Finding queries issued
    pub queries_issued: usize,
    /// Wanted findings after deduplication and rule filtering
    pub findings_aggregated: usize,
    /// Findings whose owner tree is outside the resolved scope
    pub findings_dropped: usize,
    /// Units in the resolved scope
    pub units_in_scope: usize,
    /// Units the fix function was invoked for
    pub units_attempted: usize,
    /// Units whose root changed
    pub units_fixed: usize,
    /// Wall-clock duration of the batch
    pub elapsed: Duration,
}

impl BatchReport {
    /// Units carried over unchanged
    #[inline]
    #[must_use]
    pub fn units_unchanged(&self) -> usize {
        self.units_in_scope.saturating_sub(self.units_fixed)
    }

    /// Whether anything changed
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.units_fixed > 0
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} findings ({} dropped) over {} units: {} fixed, {} unchanged in {:?}",
            self.findings_aggregated,
            self.findings_dropped,
            self.units_in_scope,
            self.units_fixed,
            self.units_unchanged(),
            self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_is_derived() {
        let report = BatchReport {
            units_in_scope: 5,
            units_fixed: 2,
            ..BatchReport::default()
        };
        assert_eq!(report.units_unchanged(), 3);
        assert!(report.changed());
        assert!(!BatchReport::default().changed());
    }

    #[test]
    fn serializes_to_json() {
        let report = BatchReport {
            findings_aggregated: 4,
            ..BatchReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["findings_aggregated"], 4);
    }
}
