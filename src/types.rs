//! Core types for autosubmit

use serde::{Deserialize, Serialize};

/// Minimal, host-agnostic projection of a change
///
/// Built fresh from each event or query result and never mutated.
/// Group membership compares topics, not object identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Project (repository) name
    pub project: String,
    /// Numeric change number
    pub number: u64,
    /// Topic tag, if any
    pub topic: Option<String>,
    /// Target branch name
    pub branch: String,
    /// Change-Id (`I...`) or triplet id
    pub id: String,
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.project, self.number)
    }
}

/// Change status as reported by the review service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    /// Open for review
    New,
    /// Merged into its branch
    Merged,
    /// Abandoned
    Abandoned,
}

impl ChangeStatus {
    /// Whether the change is still open
    pub const fn is_open(self) -> bool {
        matches!(self, Self::New)
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "open"),
            Self::Merged => write!(f, "merged"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Evaluation status of one submit requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    /// Requirement met
    Satisfied,
    /// Requirement not met
    Unsatisfied,
    /// Requirement bypassed by an override
    Overridden,
    /// Requirement force-satisfied by a privileged submitter
    Forced,
    /// Requirement does not apply to this change
    NotApplicable,
    /// Requirement could not be evaluated
    Error,
    /// Evaluation was skipped
    #[serde(other)]
    Unknown,
}

impl RequirementStatus {
    /// Whether this status counts as fulfilled
    pub const fn is_fulfilled(self) -> bool {
        matches!(
            self,
            Self::Satisfied | Self::Overridden | Self::Forced | Self::NotApplicable
        )
    }
}

/// Result of one submit requirement evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequirementResult {
    /// Requirement name (e.g. "Code-Review")
    pub name: String,
    /// Evaluation outcome
    pub status: RequirementStatus,
}

/// Extended change details, as returned by change lookups and queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Project name
    pub project: String,
    /// Change number
    pub number: u64,
    /// Change-Id
    pub id: String,
    /// Topic, if set
    pub topic: Option<String>,
    /// Target branch
    pub branch: String,
    /// Current status
    pub status: ChangeStatus,
    /// Commit SHA of the current revision
    pub current_revision: Option<String>,
    /// Submit requirement results (empty if not requested)
    pub submit_requirements: Vec<SubmitRequirementResult>,
}

impl ChangeInfo {
    /// Project the canonical summary out of the full details
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            project: self.project.clone(),
            number: self.number,
            topic: self.topic.clone(),
            branch: self.branch.clone(),
            id: self.id.clone(),
        }
    }
}

/// One entry of a change's related-commit list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedChange {
    /// Commit SHA
    pub commit: String,
    /// Change number owning the commit, if any
    pub change_number: Option<u64>,
    /// Status of the owning change, if any
    pub status: Option<ChangeStatus>,
}

impl RelatedChange {
    /// Whether the owning change is merged
    pub fn is_merged(&self) -> bool {
        self.status == Some(ChangeStatus::Merged)
    }
}

/// Numeric account id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A label vote posted alongside a review message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDelta {
    /// Label name (e.g. "Code-Review")
    pub name: String,
    /// Score (e.g. -1)
    pub value: i32,
}

impl std::fmt::Display for LabelDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:+}", self.name, self.value)
    }
}

/// Change queries the coordinator issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeQuery {
    /// Open changes carrying exactly this topic
    OpenWithTopic(String),
    /// Open, submittable changes on one branch of one project
    SubmittableOnBranch {
        /// Project name
        project: String,
        /// Short branch name
        branch: String,
    },
}

impl ChangeQuery {
    /// Render as a Gerrit query string
    pub fn to_query_string(&self) -> String {
        match self {
            Self::OpenWithTopic(topic) => {
                format!("status:open topic:\"{}\"", escape_query_value(topic))
            }
            Self::SubmittableOnBranch { project, branch } => format!(
                "status:open is:submittable project:\"{}\" branch:\"{}\"",
                escape_query_value(project),
                escape_query_value(branch)
            ),
        }
    }
}

impl std::fmt::Display for ChangeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_query_is_quoted() {
        let q = ChangeQuery::OpenWithTopic("crossrepo/123".to_string());
        assert_eq!(q.to_query_string(), "status:open topic:\"crossrepo/123\"");
    }

    #[test]
    fn test_query_escapes_quotes() {
        let q = ChangeQuery::OpenWithTopic("a\"b".to_string());
        assert_eq!(q.to_query_string(), "status:open topic:\"a\\\"b\"");
    }

    #[test]
    fn test_requirement_fulfilment() {
        assert!(RequirementStatus::Satisfied.is_fulfilled());
        assert!(RequirementStatus::Overridden.is_fulfilled());
        assert!(RequirementStatus::Forced.is_fulfilled());
        assert!(RequirementStatus::NotApplicable.is_fulfilled());
        assert!(!RequirementStatus::Unsatisfied.is_fulfilled());
        assert!(!RequirementStatus::Error.is_fulfilled());
    }

    #[test]
    fn test_forced_requirement_passes_gate() {
        let result: SubmitRequirementResult =
            serde_json::from_str(r#"{"name": "Code-Review", "status": "FORCED"}"#).unwrap();
        assert_eq!(result.status, RequirementStatus::Forced);
        assert!(result.status.is_fulfilled());
    }

    #[test]
    fn test_label_delta_display_keeps_sign() {
        let hold = LabelDelta {
            name: "Code-Review".to_string(),
            value: -1,
        };
        assert_eq!(hold.to_string(), "Code-Review-1");
    }
}
