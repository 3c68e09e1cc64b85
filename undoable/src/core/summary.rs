//! Aggregate view over a batch's per-file results.

use crate::core::types::{ApplyResult, ApplyStatus};

/// Status counts for one apply/revert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ApplyResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status {
                ApplyStatus::Success => summary.success += 1,
                ApplyStatus::Failure => summary.failure += 1,
                ApplyStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Every selected change succeeded. Skipped entries were not selected, so
    /// they do not affect cleanliness.
    pub fn is_clean(&self) -> bool {
        self.failure == 0
    }

    pub fn selected(&self) -> usize {
        self.success + self.failure
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.success, self.skipped, self.failure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FailureKind, FileChange};

    #[test]
    fn counts_each_status() {
        let a = FileChange::create("a", "a");
        let results = vec![
            ApplyResult::success(&a),
            ApplyResult::skipped(&a, "not selected"),
            ApplyResult::failure(&a, FailureKind::Io, "denied"),
            ApplyResult::success(&a),
        ];
        let summary = BatchSummary::from_results(&results);
        assert_eq!(
            summary,
            BatchSummary {
                success: 2,
                failure: 1,
                skipped: 1
            }
        );
        assert!(!summary.is_clean());
        assert_eq!(summary.selected(), 3);
        assert_eq!(summary.to_string(), "2 succeeded, 1 skipped, 1 failed");
    }

    #[test]
    fn skipped_only_batch_is_clean() {
        let a = FileChange::delete("a");
        let summary = BatchSummary::from_results(&[ApplyResult::skipped(&a, "not selected")]);
        assert!(summary.is_clean());
    }
}
