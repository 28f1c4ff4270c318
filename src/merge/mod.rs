//! Submission engine for atomic groups
//!
//! Three-phase pattern:
//! 1. Gather - fetch member readiness (effectful, in the coordinator)
//! 2. Plan - create `GroupPlan` (pure, testable)
//! 3. Execute - perform submissions (effectful)

mod execute;
mod plan;

pub use execute::{MergeExecutionResult, execute_group_submission};
pub use plan::{BlockCause, GroupPlan, MemberCheck, plan_group_submission};
