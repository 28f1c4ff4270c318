//! Readiness oracle - per-change yes/no questions
//!
//! Answers three independent questions about one change: is it an atomic
//! group member, is it submit-ready, does it sit on an unmerged ancestor.
//! Every answer is rederived from the review service on each call.

use crate::config::AutomergeConfig;
use crate::error::{Error, Result};
use crate::platform::ReviewService;
use crate::types::{AccountId, ChangeInfo, ChangeSummary, RelatedChange};
use std::sync::Arc;
use tracing::{debug, info};

/// Readiness of one change, as three independent answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ReadinessVerdict {
    /// Topic carries the atomic prefix
    pub is_atomic_topic: bool,
    /// Every submit requirement is fulfilled
    pub is_submittable: bool,
    /// The current revision has an unmerged ancestor
    pub has_unmerged_ancestor: bool,
}

/// Find the first unmerged ancestor in a related-commit list (PURE)
///
/// The list is ordered descendants first, then the change itself, then
/// its ancestors nearest-first. Entries strictly after `own_commit` are
/// scanned; if `own_commit` is absent from the list every entry is.
pub fn first_unmerged_ancestor<'a>(
    related: &'a [RelatedChange],
    own_commit: Option<&str>,
) -> Option<&'a RelatedChange> {
    let start = own_commit
        .and_then(|sha| related.iter().position(|r| r.commit == sha))
        .map_or(0, |i| i + 1);

    related[start..].iter().find(|r| !r.is_merged())
}

/// Map a permission failure to a plain lookup failure
///
/// The bot must not act on the difference between "missing" and
/// "forbidden".
fn as_lookup(number: u64, error: Error) -> Error {
    match error {
        Error::PermissionDenied(_) => Error::Lookup(format!("change {number} not found")),
        other => other,
    }
}

/// Readiness oracle backed by a review service
#[derive(Clone)]
pub struct ReadinessOracle {
    service: Arc<dyn ReviewService>,
    config: Arc<AutomergeConfig>,
}

impl ReadinessOracle {
    /// Create a new oracle
    pub fn new(service: Arc<dyn ReviewService>, config: Arc<AutomergeConfig>) -> Self {
        Self { service, config }
    }

    /// Check if a change is an atomic change, i.e. its topic carries the
    /// configured prefix. Pure, exact, case-sensitive.
    pub fn is_atomic_review(&self, change: &ChangeSummary) -> bool {
        let atomic = self.config.is_atomic_topic(change.topic.as_deref());
        debug!(change = change.number, atomic, "checked atomic topic");
        atomic
    }

    /// Resolve the bot account by its configured email
    ///
    /// Fails with [`Error::NoBotAccount`] or [`Error::AmbiguousBotAccount`]
    /// unless exactly one account matches.
    pub async fn bot_account(&self) -> Result<AccountId> {
        let email = &self.config.bot_email;
        let ids = self.service.resolve_accounts_by_email(email).await?;
        match ids.as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::NoBotAccount(email.clone())),
            _ => Err(Error::AmbiguousBotAccount {
                email: email.clone(),
                count: ids.len(),
            }),
        }
    }

    /// Fetch a change as the bot, failing with `Lookup` if it cannot be read
    pub async fn lookup(&self, project: &str, number: u64) -> Result<ChangeInfo> {
        self.service
            .get_change(project, number)
            .await
            .map_err(|e| as_lookup(number, e))
    }

    /// Check if a change is submittable
    ///
    /// True iff the change is still open and every submit requirement is
    /// fulfilled. Merged or abandoned changes are never submittable.
    pub async fn is_submittable(&self, project: &str, number: u64) -> Result<bool> {
        debug!(project, change = number, "checking if change is submittable");
        let change = self.lookup(project, number).await?;

        if !change.status.is_open() {
            debug!(change = number, status = %change.status, "change is not open");
            return Ok(false);
        }

        let unfulfilled: Vec<&str> = change
            .submit_requirements
            .iter()
            .filter(|r| !r.status.is_fulfilled())
            .map(|r| r.name.as_str())
            .collect();

        if unfulfilled.is_empty() {
            debug!(change = number, "change is submittable");
            Ok(true)
        } else {
            debug!(change = number, ?unfulfilled, "change is not submittable");
            Ok(false)
        }
    }

    /// Check if the current revision merges without git conflict
    pub async fn is_mergeable(&self, project: &str, number: u64) -> Result<bool> {
        self.service
            .is_mergeable(project, number)
            .await
            .map_err(|e| as_lookup(number, e))
    }

    /// Check if the current revision has an unmerged ancestor
    pub async fn has_dependent_review(&self, project: &str, number: u64) -> Result<bool> {
        debug!(project, change = number, "checking for related changes");
        let change = self.lookup(project, number).await?;
        let related = self
            .service
            .get_related_changes(project, number)
            .await
            .map_err(|e| as_lookup(number, e))?;

        match first_unmerged_ancestor(&related, change.current_revision.as_deref()) {
            Some(parent) => {
                info!(
                    change = number,
                    commit = %parent.commit,
                    "found non merged parent commit"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Compute all three answers for one change
    pub async fn verdict(&self, change: &ChangeSummary) -> Result<ReadinessVerdict> {
        Ok(ReadinessVerdict {
            is_atomic_topic: self.is_atomic_review(change),
            is_submittable: self.is_submittable(&change.project, change.number).await?,
            has_unmerged_ancestor: self
                .has_dependent_review(&change.project, change.number)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeStatus;

    fn related(commit: &str, status: ChangeStatus) -> RelatedChange {
        RelatedChange {
            commit: commit.to_string(),
            change_number: None,
            status: Some(status),
        }
    }

    #[test]
    fn test_empty_related_list_has_no_ancestor() {
        assert!(first_unmerged_ancestor(&[], Some("abc")).is_none());
    }

    #[test]
    fn test_descendants_are_ignored() {
        let list = vec![
            related("child", ChangeStatus::New),
            related("self", ChangeStatus::New),
            related("parent", ChangeStatus::Merged),
        ];
        assert!(first_unmerged_ancestor(&list, Some("self")).is_none());
    }

    #[test]
    fn test_unmerged_ancestor_found_nearest_first() {
        let list = vec![
            related("self", ChangeStatus::New),
            related("parent", ChangeStatus::Merged),
            related("grandparent", ChangeStatus::New),
            related("root", ChangeStatus::New),
        ];
        let found = first_unmerged_ancestor(&list, Some("self")).unwrap();
        assert_eq!(found.commit, "grandparent");
    }

    #[test]
    fn test_own_commit_missing_scans_whole_list() {
        let list = vec![
            related("child", ChangeStatus::New),
            related("parent", ChangeStatus::Merged),
        ];
        let found = first_unmerged_ancestor(&list, Some("unknown")).unwrap();
        assert_eq!(found.commit, "child");
    }

    #[test]
    fn test_missing_status_counts_as_unmerged() {
        let list = vec![
            related("self", ChangeStatus::New),
            RelatedChange {
                commit: "parent".to_string(),
                change_number: None,
                status: None,
            },
        ];
        assert!(first_unmerged_ancestor(&list, Some("self")).is_some());
    }

    #[test]
    fn test_permission_denied_becomes_lookup() {
        let mapped = as_lookup(5, Error::PermissionDenied("nope".to_string()));
        assert!(matches!(mapped, Error::Lookup(_)));
    }
}
