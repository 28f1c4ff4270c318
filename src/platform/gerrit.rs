//! Gerrit REST service implementation

use crate::error::{Error, Result};
use crate::platform::ReviewService;
use crate::types::{
    AccountId, ChangeInfo, ChangeQuery, ChangeStatus, LabelDelta, RelatedChange,
    RequirementStatus, SubmitRequirementResult,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix Gerrit puts in front of every JSON body to defeat XSSI
const XSSI_PREFIX: &str = ")]}'";

/// Tag attached to every review this service posts
pub const REVIEW_TAG: &str = "autogenerated:autosubmitter";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gerrit service using reqwest
///
/// Authenticates with HTTP credentials of the bot account, so every call
/// is performed as that account. The `actor` passed to write calls is only
/// used for logging.
pub struct GerritService {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct GerritChange {
    project: String,
    #[serde(rename = "_number")]
    number: u64,
    change_id: String,
    topic: Option<String>,
    branch: String,
    status: ChangeStatus,
    current_revision: Option<String>,
    #[serde(default)]
    submit_requirements: Vec<GerritSubmitRequirement>,
}

#[derive(Deserialize)]
struct GerritSubmitRequirement {
    name: String,
    status: RequirementStatus,
}

#[derive(Deserialize)]
struct MergeableInfo {
    mergeable: bool,
}

#[derive(Deserialize)]
struct RelatedChangesInfo {
    #[serde(default)]
    changes: Vec<RelatedChangeAndCommitInfo>,
}

#[derive(Deserialize)]
struct RelatedChangeAndCommitInfo {
    #[serde(rename = "_change_number")]
    change_number: Option<u64>,
    commit: RelatedCommit,
    status: Option<String>,
}

#[derive(Deserialize)]
struct RelatedCommit {
    commit: String,
}

#[derive(Deserialize)]
struct AccountInfo {
    #[serde(rename = "_account_id")]
    account_id: u64,
}

#[derive(Serialize)]
struct ReviewPayload<'a> {
    message: &'a str,
    tag: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<&'a str, i32>,
}

impl From<GerritChange> for ChangeInfo {
    fn from(change: GerritChange) -> Self {
        Self {
            project: change.project,
            number: change.number,
            id: change.change_id,
            topic: change.topic.filter(|t| !t.is_empty()),
            branch: change.branch,
            status: change.status,
            current_revision: change.current_revision,
            submit_requirements: change
                .submit_requirements
                .into_iter()
                .map(|r| SubmitRequirementResult {
                    name: r.name,
                    status: r.status,
                })
                .collect(),
        }
    }
}

impl From<RelatedChangeAndCommitInfo> for RelatedChange {
    fn from(related: RelatedChangeAndCommitInfo) -> Self {
        let status = related.status.as_deref().map(|s| match s {
            "MERGED" => ChangeStatus::Merged,
            "ABANDONED" => ChangeStatus::Abandoned,
            _ => ChangeStatus::New,
        });
        Self {
            commit: related.commit.commit,
            change_number: related.change_number,
            status,
        }
    }
}

/// Strip the XSSI prefix and decode a Gerrit JSON body
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let json = body.strip_prefix(XSSI_PREFIX).unwrap_or(body);
    Ok(serde_json::from_str(json.trim_start())?)
}

impl GerritService {
    /// Create a new Gerrit service
    ///
    /// `base_url` is the server root, e.g. `https://review.example.com`.
    pub fn new(base_url: &str, username: String, password: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent("autosubmit")
            .build()
            .map_err(|e| Error::GerritApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/a{}", self.base_url, path)
    }

    fn change_url(project: &str, number: u64) -> String {
        format!("/changes/{}~{}", urlencoding::encode(project), number)
    }

    /// Send an authenticated request and return the raw body
    ///
    /// `what` names the target in error messages.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::NOT_FOUND => Err(Error::Lookup(format!("{what} not found"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::PermissionDenied(format!("{what}: {}", body.trim())))
            }
            s => Err(Error::GerritApi(format!("{what}: HTTP {s}: {}", body.trim()))),
        }
    }
}

#[async_trait]
impl ReviewService for GerritService {
    async fn get_change(&self, project: &str, number: u64) -> Result<ChangeInfo> {
        debug!(project, change = number, "getting change");
        let url = self.api_url(&Self::change_url(project, number));

        let body = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("o", "CURRENT_REVISION"), ("o", "SUBMIT_REQUIREMENTS")]),
                &format!("change {number}"),
            )
            .await?;

        let change: GerritChange = parse_body(&body)?;
        let info: ChangeInfo = change.into();
        debug!(project, change = number, status = %info.status, "got change");
        Ok(info)
    }

    async fn is_mergeable(&self, project: &str, number: u64) -> Result<bool> {
        debug!(project, change = number, "checking mergeability");
        let url = self.api_url(&format!(
            "{}/revisions/current/mergeable",
            Self::change_url(project, number)
        ));

        let body = self
            .send(self.client.get(&url), &format!("change {number}"))
            .await?;

        let info: MergeableInfo = parse_body(&body)?;
        debug!(project, change = number, mergeable = info.mergeable, "checked mergeability");
        Ok(info.mergeable)
    }

    async fn get_related_changes(&self, project: &str, number: u64) -> Result<Vec<RelatedChange>> {
        debug!(project, change = number, "getting related changes");
        let url = self.api_url(&format!(
            "{}/revisions/current/related",
            Self::change_url(project, number)
        ));

        let body = self
            .send(self.client.get(&url), &format!("change {number}"))
            .await?;

        let related: RelatedChangesInfo = parse_body(&body)?;
        let changes: Vec<RelatedChange> = related.changes.into_iter().map(Into::into).collect();
        debug!(project, change = number, count = changes.len(), "got related changes");
        Ok(changes)
    }

    async fn query_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeInfo>> {
        let q = query.to_query_string();
        debug!(query = %q, "querying changes");
        let url = self.api_url("/changes/");

        let body = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("q", q.as_str()), ("o", "CURRENT_REVISION")]),
                "change query",
            )
            .await?;

        let changes: Vec<GerritChange> = parse_body(&body)?;
        let result: Vec<ChangeInfo> = changes.into_iter().map(Into::into).collect();
        debug!(query = %q, count = result.len(), "queried changes");
        Ok(result)
    }

    async fn submit(&self, project: &str, number: u64, actor: AccountId) -> Result<()> {
        debug!(project, change = number, %actor, "submitting change");
        let url = self.api_url(&format!(
            "{}/revisions/current/submit",
            Self::change_url(project, number)
        ));

        self.send(
            self.client.post(&url).json(&serde_json::json!({})),
            &format!("change {number}"),
        )
        .await?;

        debug!(project, change = number, "submitted change");
        Ok(())
    }

    async fn post_review(
        &self,
        project: &str,
        number: u64,
        actor: AccountId,
        message: &str,
        label: Option<&LabelDelta>,
    ) -> Result<()> {
        debug!(project, change = number, %actor, "posting review");
        let url = self.api_url(&format!(
            "{}/revisions/current/review",
            Self::change_url(project, number)
        ));

        let payload = ReviewPayload {
            message,
            tag: REVIEW_TAG,
            labels: label
                .map(|l| BTreeMap::from([(l.name.as_str(), l.value)]))
                .unwrap_or_default(),
        };

        self.send(self.client.post(&url).json(&payload), &format!("change {number}"))
            .await?;

        debug!(project, change = number, "posted review");
        Ok(())
    }

    async fn resolve_accounts_by_email(&self, email: &str) -> Result<Vec<AccountId>> {
        debug!(email, "resolving account");
        let url = self.api_url("/accounts/");
        let q = format!("email:{email}");

        let body = match self
            .send(self.client.get(&url).query(&[("q", q.as_str())]), "account query")
            .await
        {
            Ok(body) => body,
            // Gerrit answers an unmatched account query with an empty list,
            // but some versions reply 404
            Err(Error::Lookup(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let accounts: Vec<AccountInfo> = parse_body(&body)?;
        let ids: Vec<AccountId> = accounts.into_iter().map(|a| AccountId(a.account_id)).collect();
        debug!(email, count = ids.len(), "resolved accounts");
        Ok(ids)
    }
}
