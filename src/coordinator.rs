//! Atomic coordinator - the all-or-nothing decision core
//!
//! One invocation runs to completion in a single pass and keeps no state
//! between calls. Serialisation of concurrent invocations is the caller's
//! job (see `dispatcher`).

use crate::config::{AutomergeConfig, CommentKind};
use crate::error::Result;
use crate::executor::MergeExecutor;
use crate::group::GroupResolver;
use crate::merge::{
    BlockCause, GroupPlan, MemberCheck, execute_group_submission, plan_group_submission,
};
use crate::oracle::ReadinessOracle;
use crate::platform::ReviewService;
use crate::types::ChangeSummary;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Outcome of one submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The triggering change is not submit-ready; nothing evaluated
    NotSubmittable,
    /// A group member is not submit-ready yet; no comment posted
    GroupNotReady {
        /// First member lacking approvals
        member: u64,
    },
    /// A member blocks the group; one comment posted on the trigger
    Blocked {
        /// Failing member
        member: u64,
        /// Why it fails
        cause: BlockCause,
    },
    /// Every member was submitted
    Submitted {
        /// Submitted change numbers
        merged: Vec<u64>,
    },
    /// Submission failed part-way through the commit phase
    PartiallySubmitted {
        /// Members submitted before the failure
        merged: Vec<u64>,
        /// Member whose submission failed
        failed: u64,
        /// Failure message
        error: String,
    },
}

impl SubmitOutcome {
    /// Change numbers submitted during this attempt
    pub fn merged(&self) -> &[u64] {
        match self {
            Self::Submitted { merged } | Self::PartiallySubmitted { merged, .. } => merged,
            _ => &[],
        }
    }
}

/// Outcome of a new-membership notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipNotice {
    /// Change is not in an atomic group; nothing posted
    NotAtomic,
    /// Posted the "part of a cross-repo group" comment
    Detected,
    /// Posted the "blocked by unmerged ancestor" comment
    BlockedByAncestor,
}

/// Decides, for one change, whether its whole group can be submitted
#[derive(Clone)]
pub struct AtomicCoordinator {
    config: Arc<AutomergeConfig>,
    oracle: ReadinessOracle,
    groups: GroupResolver,
    executor: MergeExecutor,
}

impl AtomicCoordinator {
    /// Build the coordinator and its collaborators over one review service
    pub fn new(service: Arc<dyn ReviewService>, config: Arc<AutomergeConfig>) -> Self {
        let oracle = ReadinessOracle::new(Arc::clone(&service), Arc::clone(&config));
        let groups = GroupResolver::new(Arc::clone(&service), oracle.clone());
        let executor = MergeExecutor::new(service, oracle.clone());
        Self {
            config,
            oracle,
            groups,
            executor,
        }
    }

    /// The readiness oracle this coordinator consults
    pub const fn oracle(&self) -> &ReadinessOracle {
        &self.oracle
    }

    /// Submit `change` and its whole group if every member is ready
    ///
    /// Merge eligibility of every member is evaluated before any member is
    /// submitted, stopping at the first member that blocks the group. Lookup failures abort before the commit phase, so they
    /// never leave a partially merged group.
    pub async fn attempt_submit(&self, change: &ChangeSummary) -> Result<SubmitOutcome> {
        // Gate
        if !self
            .oracle
            .is_submittable(&change.project, change.number)
            .await?
        {
            debug!(change = change.number, "change is not submittable");
            return Ok(SubmitOutcome::NotSubmittable);
        }

        let atomic = self.oracle.is_atomic_review(change);
        let group = self.groups.resolve_group(change).await?;

        if atomic {
            for member in &group {
                if !self
                    .oracle
                    .is_submittable(&member.project, member.number)
                    .await?
                {
                    info!(
                        change = change.number,
                        member = member.number,
                        "change is not submittable because same topic change has not all approvals"
                    );
                    return Ok(SubmitOutcome::GroupNotReady {
                        member: member.number,
                    });
                }
            }
        }

        // Stop at the first blocking member; later members are never queried
        let mut checks = Vec::with_capacity(group.len());
        for member in &group {
            let check = MemberCheck {
                change: member.clone(),
                mergeable: self
                    .oracle
                    .is_mergeable(&member.project, member.number)
                    .await?,
                has_unmerged_ancestor: self
                    .oracle
                    .has_dependent_review(&member.project, member.number)
                    .await?,
            };
            let blocked = check.block_cause().is_some();
            checks.push(check);
            if blocked {
                break;
            }
        }

        match plan_group_submission(&checks) {
            GroupPlan::Blocked { member, cause } => {
                info!(
                    change = change.number,
                    member = member.number,
                    "change is not mergeable because same topic change {cause}"
                );
                let text = self
                    .config
                    .templates
                    .render(cause.comment_kind(), member.number);
                self.executor
                    .comment_on_review(&change.project, change.number, &text, None)
                    .await?;
                Ok(SubmitOutcome::Blocked {
                    member: member.number,
                    cause,
                })
            }
            GroupPlan::Submit { members } => {
                info!(
                    change = change.number,
                    atomic,
                    members = members.len(),
                    "submitting change"
                );
                // bot account errors propagate instead of ending the commit phase
                self.oracle.bot_account().await?;
                let result = execute_group_submission(&members, &self.executor).await;
                match result.failed {
                    None => Ok(SubmitOutcome::Submitted {
                        merged: result.merged,
                    }),
                    Some(failed) => {
                        error!(
                            change = change.number,
                            failed,
                            merged = ?result.merged,
                            "commit phase aborted"
                        );
                        Ok(SubmitOutcome::PartiallySubmitted {
                            merged: result.merged,
                            failed,
                            error: result.error_message.unwrap_or_default(),
                        })
                    }
                }
            }
        }
    }

    /// Tell a change that it just joined an atomic group
    ///
    /// Posts either the "part of a cross-repo group" comment or, when the
    /// change already sits on an unmerged ancestor, the "blocked" comment
    /// together with the configured hold vote.
    pub async fn notify_new_membership(&self, change: &ChangeSummary) -> Result<MembershipNotice> {
        if !self.oracle.is_atomic_review(change) {
            return Ok(MembershipNotice::NotAtomic);
        }

        self.oracle.lookup(&change.project, change.number).await?;
        info!(change = change.number, "detected atomic review");

        let templates = &self.config.templates;
        if self
            .oracle
            .has_dependent_review(&change.project, change.number)
            .await?
        {
            info!(
                change = change.number,
                "warn the user, as the change depends on a non merged commit"
            );
            self.executor
                .comment_on_review(
                    &change.project,
                    change.number,
                    templates.get(CommentKind::BlockedByUnmergedAncestor),
                    self.config.hold_label.as_ref(),
                )
                .await?;
            Ok(MembershipNotice::BlockedByAncestor)
        } else {
            self.executor
                .comment_on_review(
                    &change.project,
                    change.number,
                    templates.get(CommentKind::AtomicReviewDetected),
                    None,
                )
                .await?;
            Ok(MembershipNotice::Detected)
        }
    }
}
