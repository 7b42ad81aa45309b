//! Error types for fixall core
//!
//! Every failure aborts the whole batch: no partial corpus is ever returned
//! alongside an error.

use fixall_composition::CompositionError;
use fixall_syntax::{GroupId, SyntaxError, UnitId};

/// Main batch-fix error type
#[derive(Debug, thiserror::Error)]
pub enum FixAllError {
    /// Cancellation was requested before the batch finished
    #[error("batch fix cancelled")]
    Cancelled,

    /// A fix function raised an error for one unit
    #[error("fix failed for unit {unit}: {source}")]
    FixFailed {
        /// Unit whose fix raised
        unit: UnitId,
        /// Error raised by the fix function
        #[source]
        source: anyhow::Error,
    },

    /// Finding provider failed
    #[error("finding aggregation failed for {target}: {source}")]
    Aggregation {
        /// Query target description
        target: String,
        /// Error raised by the provider
        #[source]
        source: anyhow::Error,
    },

    /// Tree resolver failed
    #[error("tree resolution failed for unit {unit}: {source}")]
    TreeResolution {
        /// Unit whose root could not be resolved
        unit: UnitId,
        /// Error raised by the resolver
        #[source]
        source: anyhow::Error,
    },

    /// Scope names a unit outside the corpus
    #[error("unknown unit: {0}")]
    UnknownUnit(UnitId),

    /// Scope names a group outside the corpus
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    /// Snapshot composition failed
    #[error("composition failed: {0}")]
    Composition(#[from] CompositionError),

    /// Corpus operation failed
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Spawned task panicked or was aborted
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl FixAllError {
    /// Check if error is a cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if retrying at a narrower scope can isolate the failure
    ///
    /// True for errors tied to one unit's fix; re-running each unit with
    /// `Scope::Unit` identifies the broken one.
    #[inline]
    #[must_use]
    pub fn is_retryable_at_smaller_scope(&self) -> bool {
        matches!(self, Self::FixFailed { .. } | Self::TaskFailed(_))
    }

    /// Unit the error is attributed to, if any
    #[must_use]
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::FixFailed { unit, .. }
            | Self::TreeResolution { unit, .. }
            | Self::UnknownUnit(unit) => Some(*unit),
            _ => None,
        }
    }
}

/// Result alias for batch-fix operations
pub type Result<T, E = FixAllError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn fix_failure_keeps_cause_and_unit() {
        let unit = UnitId::new();
        let err = FixAllError::FixFailed {
            unit,
            source: anyhow::anyhow!("rewrite produced invalid syntax"),
        };

        assert_eq!(err.unit(), Some(unit));
        assert!(err.is_retryable_at_smaller_scope());
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("rewrite produced invalid syntax"));
        assert!(err.source().is_some());
    }

    #[test]
    fn cancellation_is_not_retryable() {
        let err = FixAllError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_retryable_at_smaller_scope());
        assert_eq!(err.unit(), None);
    }

    #[test]
    fn composition_errors_convert() {
        let unit = UnitId::new();
        let err: FixAllError = CompositionError::UnknownUnit(unit).into();
        assert!(matches!(err, FixAllError::Composition(_)));
    }
}
