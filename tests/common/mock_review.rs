//! Mock review service for testing
//!
//! Behaves like a tiny Gerrit: changes live in a map, queries are answered
//! from it, and a successful submit flips the change to merged.

#![allow(dead_code)]

use async_trait::async_trait;
use autosubmit::error::{Error, Result};
use autosubmit::platform::ReviewService;
use autosubmit::types::{
    AccountId, ChangeInfo, ChangeQuery, ChangeStatus, LabelDelta, RelatedChange,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Call record for `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub project: String,
    pub number: u64,
    pub actor: AccountId,
}

/// Call record for `post_review`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCall {
    pub number: u64,
    pub actor: AccountId,
    pub message: String,
    pub label: Option<LabelDelta>,
}

/// Hand-written mock of [`ReviewService`]
///
/// Features:
/// - Change state kept per change number
/// - Queries answered from that state
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockReviewService {
    changes: Mutex<HashMap<u64, ChangeInfo>>,
    mergeable: Mutex<HashMap<u64, bool>>,
    related: Mutex<HashMap<u64, Vec<RelatedChange>>>,
    accounts: Mutex<Vec<AccountId>>,
    forbidden: Mutex<HashSet<u64>>,
    extra_query_results: Mutex<Vec<ChangeInfo>>,
    // Call tracking
    submit_calls: Mutex<Vec<SubmitCall>>,
    review_calls: Mutex<Vec<ReviewCall>>,
    query_calls: Mutex<Vec<ChangeQuery>>,
    // Error injection
    error_on_submit: Mutex<HashMap<u64, String>>,
    error_on_review: Mutex<Option<String>>,
    error_on_query: Mutex<Option<String>>,
    error_on_related: Mutex<HashMap<u64, String>>,
}

impl Default for MockReviewService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReviewService {
    /// Create a mock with one bot account (id 1000) and no changes
    pub fn new() -> Self {
        Self {
            changes: Mutex::new(HashMap::new()),
            mergeable: Mutex::new(HashMap::new()),
            related: Mutex::new(HashMap::new()),
            accounts: Mutex::new(vec![AccountId(1000)]),
            forbidden: Mutex::new(HashSet::new()),
            extra_query_results: Mutex::new(Vec::new()),
            submit_calls: Mutex::new(Vec::new()),
            review_calls: Mutex::new(Vec::new()),
            query_calls: Mutex::new(Vec::new()),
            error_on_submit: Mutex::new(HashMap::new()),
            error_on_review: Mutex::new(None),
            error_on_query: Mutex::new(None),
            error_on_related: Mutex::new(HashMap::new()),
        }
    }

    // === Setup methods ===

    /// Insert or replace a change
    pub fn add_change(&self, change: ChangeInfo) {
        self.changes.lock().unwrap().insert(change.number, change);
    }

    /// Set the mergeable answer (default: true)
    pub fn set_mergeable(&self, number: u64, mergeable: bool) {
        self.mergeable.lock().unwrap().insert(number, mergeable);
    }

    /// Set the related-changes list (default: empty)
    pub fn set_related(&self, number: u64, related: Vec<RelatedChange>) {
        self.related.lock().unwrap().insert(number, related);
    }

    /// Replace the accounts returned for any email
    pub fn set_accounts(&self, accounts: Vec<AccountId>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    /// Make every read of a change fail with `PermissionDenied`
    pub fn forbid(&self, number: u64) {
        self.forbidden.lock().unwrap().insert(number);
    }

    /// Append a change to every query answer, whether it matches or not
    pub fn add_query_noise(&self, change: ChangeInfo) {
        self.extra_query_results.lock().unwrap().push(change);
    }

    /// Give a change an unmerged parent commit
    pub fn setup_unmerged_parent(&self, number: u64) {
        let own = self.change(number).and_then(|c| c.current_revision);
        self.set_related(
            number,
            vec![
                RelatedChange {
                    commit: own.unwrap_or_default(),
                    change_number: Some(number),
                    status: Some(ChangeStatus::New),
                },
                RelatedChange {
                    commit: format!("parent-of-{number}"),
                    change_number: Some(number + 10_000),
                    status: Some(ChangeStatus::New),
                },
            ],
        );
    }

    // === Error injection methods ===

    /// Make `submit` of one change fail
    pub fn fail_submit(&self, number: u64, msg: &str) {
        self.error_on_submit
            .lock()
            .unwrap()
            .insert(number, msg.to_string());
    }

    /// Make `post_review` fail
    pub fn fail_review(&self, msg: &str) {
        *self.error_on_review.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `query_changes` fail
    pub fn fail_query(&self, msg: &str) {
        *self.error_on_query.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_related_changes` of one change fail
    pub fn fail_related(&self, number: u64, msg: &str) {
        self.error_on_related
            .lock()
            .unwrap()
            .insert(number, msg.to_string());
    }

    // === Inspection methods ===

    /// Current state of a change
    pub fn change(&self, number: u64) -> Option<ChangeInfo> {
        self.changes.lock().unwrap().get(&number).cloned()
    }

    /// Get recorded `submit` calls
    pub fn get_submit_calls(&self) -> Vec<SubmitCall> {
        self.submit_calls.lock().unwrap().clone()
    }

    /// Change numbers passed to `submit`, in call order
    pub fn submitted_numbers(&self) -> Vec<u64> {
        self.get_submit_calls().iter().map(|c| c.number).collect()
    }

    /// Get recorded `post_review` calls
    pub fn get_review_calls(&self) -> Vec<ReviewCall> {
        self.review_calls.lock().unwrap().clone()
    }

    /// Get recorded `query_changes` calls
    pub fn get_query_calls(&self) -> Vec<ChangeQuery> {
        self.query_calls.lock().unwrap().clone()
    }

    fn read(&self, number: u64) -> Result<ChangeInfo> {
        if self.forbidden.lock().unwrap().contains(&number) {
            return Err(Error::PermissionDenied(format!("change {number}")));
        }
        self.change(number)
            .ok_or_else(|| Error::Lookup(format!("change {number} not found")))
    }

    fn matches(change: &ChangeInfo, query: &ChangeQuery) -> bool {
        if !change.status.is_open() {
            return false;
        }
        match query {
            ChangeQuery::OpenWithTopic(topic) => change.topic.as_deref() == Some(topic.as_str()),
            ChangeQuery::SubmittableOnBranch { project, branch } => {
                &change.project == project
                    && &change.branch == branch
                    && change
                        .submit_requirements
                        .iter()
                        .all(|r| r.status.is_fulfilled())
            }
        }
    }
}

#[async_trait]
impl ReviewService for MockReviewService {
    async fn get_change(&self, _project: &str, number: u64) -> Result<ChangeInfo> {
        self.read(number)
    }

    async fn is_mergeable(&self, _project: &str, number: u64) -> Result<bool> {
        self.read(number)?;
        Ok(self
            .mergeable
            .lock()
            .unwrap()
            .get(&number)
            .copied()
            .unwrap_or(true))
    }

    async fn get_related_changes(&self, _project: &str, number: u64) -> Result<Vec<RelatedChange>> {
        self.read(number)?;
        if let Some(msg) = self.error_on_related.lock().unwrap().get(&number).cloned() {
            return Err(Error::GerritApi(msg));
        }
        Ok(self
            .related
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeInfo>> {
        self.query_calls.lock().unwrap().push(query.clone());
        if let Some(msg) = self.error_on_query.lock().unwrap().clone() {
            return Err(Error::GerritApi(msg));
        }

        let mut found: Vec<ChangeInfo> = self
            .changes
            .lock()
            .unwrap()
            .values()
            .filter(|c| Self::matches(c, query))
            .cloned()
            .collect();
        found.sort_by_key(|c| c.number);
        found.extend(self.extra_query_results.lock().unwrap().iter().cloned());
        Ok(found)
    }

    async fn submit(&self, project: &str, number: u64, actor: AccountId) -> Result<()> {
        self.submit_calls.lock().unwrap().push(SubmitCall {
            project: project.to_string(),
            number,
            actor,
        });
        if let Some(msg) = self.error_on_submit.lock().unwrap().get(&number) {
            return Err(Error::GerritApi(msg.clone()));
        }

        let mut changes = self.changes.lock().unwrap();
        let change = changes
            .get_mut(&number)
            .ok_or_else(|| Error::Lookup(format!("change {number} not found")))?;
        change.status = ChangeStatus::Merged;
        Ok(())
    }

    async fn post_review(
        &self,
        _project: &str,
        number: u64,
        actor: AccountId,
        message: &str,
        label: Option<&LabelDelta>,
    ) -> Result<()> {
        self.review_calls.lock().unwrap().push(ReviewCall {
            number,
            actor,
            message: message.to_string(),
            label: label.cloned(),
        });
        if let Some(msg) = self.error_on_review.lock().unwrap().clone() {
            return Err(Error::GerritApi(msg));
        }
        Ok(())
    }

    async fn resolve_accounts_by_email(&self, _email: &str) -> Result<Vec<AccountId>> {
        Ok(self.accounts.lock().unwrap().clone())
    }
}
