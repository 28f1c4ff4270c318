//! Group submission planning - pure functions for deciding a group's fate
//!
//! No I/O happens here - member facts are gathered beforehand by the
//! coordinator, making the all-or-nothing decision easy to unit test.

use crate::config::CommentKind;
use crate::types::ChangeSummary;

/// Why a member blocks its whole group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCause {
    /// The member does not merge cleanly
    GitConflict,
    /// The member sits on an unmerged ancestor
    UnmergedDependency,
}

impl BlockCause {
    /// Comment template used to report this cause
    pub const fn comment_kind(self) -> CommentKind {
        match self {
            Self::GitConflict => CommentKind::BlockedByConflict,
            Self::UnmergedDependency => CommentKind::BlockedByDependency,
        }
    }
}

impl std::fmt::Display for BlockCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitConflict => write!(f, "is non mergeable"),
            Self::UnmergedDependency => write!(f, "depends on a non merged commit"),
        }
    }
}

/// Mergeability facts gathered for one group member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberCheck {
    /// The member
    pub change: ChangeSummary,
    /// Service reports a clean merge
    pub mergeable: bool,
    /// Current revision has an unmerged ancestor
    pub has_unmerged_ancestor: bool,
}

impl MemberCheck {
    /// The reason this member blocks, if any. Conflicts win over
    /// dependencies.
    pub const fn block_cause(&self) -> Option<BlockCause> {
        if !self.mergeable {
            Some(BlockCause::GitConflict)
        } else if self.has_unmerged_ancestor {
            Some(BlockCause::UnmergedDependency)
        } else {
            None
        }
    }
}

/// Group plan - the functional core output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPlan {
    /// Submit every member
    Submit {
        /// Members to submit
        members: Vec<ChangeSummary>,
    },
    /// A member blocks the group; nothing is submitted
    Blocked {
        /// First failing member
        member: ChangeSummary,
        /// Why it fails
        cause: BlockCause,
    },
}

impl GroupPlan {
    /// Count members that would be submitted
    #[must_use]
    pub fn submit_count(&self) -> usize {
        match self {
            Self::Submit { members } => members.len(),
            Self::Blocked { .. } => 0,
        }
    }
}

impl std::fmt::Display for GroupPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit { members } => {
                let numbers: Vec<String> = members.iter().map(|m| m.number.to_string()).collect();
                write!(f, "submit {}", numbers.join(", "))
            }
            Self::Blocked { member, cause } => {
                write!(f, "blocked: change {} {cause}", member.number)
            }
        }
    }
}

/// Create a group plan (PURE - no I/O, easily testable)
///
/// Every member's eligibility is judged before anything is submitted; the
/// first failing member, in the given order, blocks the whole group.
#[must_use]
pub fn plan_group_submission(checks: &[MemberCheck]) -> GroupPlan {
    for check in checks {
        if let Some(cause) = check.block_cause() {
            return GroupPlan::Blocked {
                member: check.change.clone(),
                cause,
            };
        }
    }

    GroupPlan::Submit {
        members: checks.iter().map(|c| c.change.clone()).collect(),
    }
}
