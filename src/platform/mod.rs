//! Review service abstraction
//!
//! Everything the coordinator needs from the code-review host, behind one
//! trait so the decision logic can run against Gerrit or a test double.

mod gerrit;

pub use gerrit::GerritService;

use crate::error::Result;
use crate::types::{AccountId, ChangeInfo, ChangeQuery, LabelDelta, RelatedChange};
use async_trait::async_trait;

/// Review service trait for change lookups, submission and comments
///
/// Implementations return [`Error::Lookup`] when a change does not exist
/// and [`Error::PermissionDenied`] when the caller may not read it.
///
/// [`Error::Lookup`]: crate::error::Error::Lookup
/// [`Error::PermissionDenied`]: crate::error::Error::PermissionDenied
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Get change details, including status, current revision and
    /// submit requirement results
    async fn get_change(&self, project: &str, number: u64) -> Result<ChangeInfo>;

    /// Whether the current revision merges into its branch without conflict
    async fn is_mergeable(&self, project: &str, number: u64) -> Result<bool>;

    /// Ordered list of commits related to the current revision
    async fn get_related_changes(&self, project: &str, number: u64) -> Result<Vec<RelatedChange>>;

    /// Run a change query, requesting current-revision metadata
    async fn query_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeInfo>>;

    /// Submit the current revision of a change
    async fn submit(&self, project: &str, number: u64, actor: AccountId) -> Result<()>;

    /// Post a review message, optionally with a label vote
    async fn post_review(
        &self,
        project: &str,
        number: u64,
        actor: AccountId,
        message: &str,
        label: Option<&LabelDelta>,
    ) -> Result<()>;

    /// Find every account registered with this email
    async fn resolve_accounts_by_email(&self, email: &str) -> Result<Vec<AccountId>>;
}
