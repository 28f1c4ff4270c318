//! Group submission execution - effectful operations
//!
//! Takes the members of a `GroupPlan::Submit` and submits them one by one
//! through the merge executor.

use crate::executor::MergeExecutor;
use crate::types::ChangeSummary;
use tracing::{error, info};

/// Result of the commit phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeExecutionResult {
    /// Changes that were successfully submitted
    pub merged: Vec<u64>,
    /// Change whose submission failed (if any)
    pub failed: Option<u64>,
    /// Error message from the failed submission (if any)
    pub error_message: Option<String>,
}

impl MergeExecutionResult {
    /// Check if every planned submission succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    /// Check if some members were submitted before a failure
    ///
    /// Submissions are never rolled back, so this is the one state in
    /// which a group ends up partially merged.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.failed.is_some() && !self.merged.is_empty()
    }
}

/// Submit every member (EFFECTFUL)
///
/// Stops at the first failure. Members submitted before it stay submitted.
pub async fn execute_group_submission(
    members: &[ChangeSummary],
    executor: &MergeExecutor,
) -> MergeExecutionResult {
    let mut result = MergeExecutionResult::default();

    for member in members {
        match executor.merge(&member.project, member.number).await {
            Ok(()) => {
                info!(project = %member.project, change = member.number, "submitted");
                result.merged.push(member.number);
            }
            Err(e) => {
                error!(
                    project = %member.project,
                    change = member.number,
                    already_merged = ?result.merged,
                    error = %e,
                    "submission failed, group left partially merged"
                );
                result.failed = Some(member.number);
                result.error_message = Some(e.to_string());
                break;
            }
        }
    }

    result
}
