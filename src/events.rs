//! Review events and their `stream-events` wire format
//!
//! Gerrit emits one JSON object per line. The wire shapes are decoded
//! here and collapsed immediately into [`Event`], which carries the
//! canonical [`ChangeSummary`]; nothing downstream sees the wire types.

use crate::error::{Error, Result};
use crate::types::ChangeSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A vote carried by a comment-added event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    /// Label name
    pub label: String,
    /// Current score
    pub value: i32,
    /// Previous score, present only when this comment changed the vote
    pub old_value: Option<i32>,
}

impl Approval {
    /// Whether this comment changed the vote
    pub fn is_delta(&self) -> bool {
        self.old_value.is_some_and(|old| old != self.value)
    }
}

/// Review events the dispatcher reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A new patchset was uploaded
    PatchSetCreated {
        /// The change, with its current topic
        change: ChangeSummary,
    },
    /// A change's topic was set or edited
    TopicChanged {
        /// The change, carrying the new topic
        change: ChangeSummary,
        /// Topic before the edit
        old_topic: Option<String>,
    },
    /// A reviewer (and possibly a blocking vote) was removed
    ReviewerDeleted {
        /// The change
        change: ChangeSummary,
    },
    /// A comment, possibly with votes, was posted
    CommentAdded {
        /// The change
        change: ChangeSummary,
        /// Email of the commenting account, if known
        author_email: Option<String>,
        /// Full comment text
        comment: String,
        /// Votes attached to the comment
        approvals: Vec<Approval>,
    },
    /// A branch or other ref moved
    RefUpdated {
        /// Project the ref belongs to
        project: String,
        /// Full ref name (e.g. `refs/heads/master`)
        ref_name: String,
    },
}

impl Event {
    /// The change this event is about, if any
    pub const fn change(&self) -> Option<&ChangeSummary> {
        match self {
            Self::PatchSetCreated { change }
            | Self::TopicChanged { change, .. }
            | Self::ReviewerDeleted { change }
            | Self::CommentAdded { change, .. } => Some(change),
            Self::RefUpdated { .. } => None,
        }
    }

    /// Short kind name for logs
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PatchSetCreated { .. } => "patchset-created",
            Self::TopicChanged { .. } => "topic-changed",
            Self::ReviewerDeleted { .. } => "reviewer-deleted",
            Self::CommentAdded { .. } => "comment-added",
            Self::RefUpdated { .. } => "ref-updated",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefUpdated { project, ref_name } => {
                write!(f, "{} {project}:{ref_name}", self.kind())
            }
            other => match other.change() {
                Some(change) => write!(f, "{} {change}", other.kind()),
                None => f.write_str(other.kind()),
            },
        }
    }
}

/// Short branch name for a ref, or `None` for non-branch refs
///
/// `refs/heads/master` and `master` both yield `master`; change, meta,
/// tag and other refs under `refs/` yield `None`.
pub fn branch_of_ref(ref_name: &str) -> Option<&str> {
    ref_name.strip_prefix("refs/heads/").map_or_else(
        || (!ref_name.starts_with("refs/")).then_some(ref_name),
        Some,
    )
}

// =============================================================================
// Wire format
// =============================================================================

/// Older servers send numbers as strings
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn optional_score<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct WireChange {
    project: String,
    branch: String,
    id: String,
    #[serde(deserialize_with = "number_or_string")]
    number: u64,
    topic: Option<String>,
}

impl From<WireChange> for ChangeSummary {
    fn from(change: WireChange) -> Self {
        Self {
            project: change.project,
            number: change.number,
            topic: change.topic.filter(|t| !t.is_empty()),
            branch: change.branch,
            id: change.id,
        }
    }
}

#[derive(Deserialize)]
struct WireAccount {
    email: Option<String>,
}

#[derive(Deserialize)]
struct WireApproval {
    #[serde(rename = "type")]
    label: String,
    #[serde(default, deserialize_with = "optional_score")]
    value: Option<i32>,
    #[serde(rename = "oldValue", default, deserialize_with = "optional_score")]
    old_value: Option<i32>,
}

#[derive(Deserialize)]
struct WireRefUpdate {
    project: String,
    #[serde(rename = "refName")]
    ref_name: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WireEvent {
    PatchsetCreated {
        change: WireChange,
    },
    TopicChanged {
        change: WireChange,
        #[serde(rename = "oldTopic")]
        old_topic: Option<String>,
    },
    ReviewerDeleted {
        change: WireChange,
    },
    CommentAdded {
        change: WireChange,
        author: Option<WireAccount>,
        #[serde(default)]
        comment: String,
        #[serde(default)]
        approvals: Vec<WireApproval>,
    },
    RefUpdated {
        #[serde(rename = "refUpdate")]
        ref_update: WireRefUpdate,
    },
    #[serde(other)]
    Other,
}

/// Envelope fields shared by every event
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(rename = "eventCreatedOn", default, with = "chrono::serde::ts_seconds_option")]
    created_on: Option<DateTime<Utc>>,
}

impl From<WireEvent> for Option<Event> {
    fn from(event: WireEvent) -> Self {
        Some(match event {
            WireEvent::PatchsetCreated { change } => Event::PatchSetCreated {
                change: change.into(),
            },
            WireEvent::TopicChanged { change, old_topic } => Event::TopicChanged {
                change: change.into(),
                old_topic: old_topic.filter(|t| !t.is_empty()),
            },
            WireEvent::ReviewerDeleted { change } => Event::ReviewerDeleted {
                change: change.into(),
            },
            WireEvent::CommentAdded {
                change,
                author,
                comment,
                approvals,
            } => Event::CommentAdded {
                change: change.into(),
                author_email: author.and_then(|a| a.email),
                comment,
                approvals: approvals
                    .into_iter()
                    .map(|a| Approval {
                        label: a.label,
                        value: a.value.unwrap_or(0),
                        old_value: a.old_value,
                    })
                    .collect(),
            },
            WireEvent::RefUpdated { ref_update } => Event::RefUpdated {
                project: ref_update.project,
                ref_name: ref_update.ref_name,
            },
            WireEvent::Other => return None,
        })
    }
}

/// A decoded event line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedEvent {
    /// The event
    pub event: Event,
    /// When the server created it, if reported
    pub created_on: Option<DateTime<Utc>>,
}

/// Decode one `stream-events` line
///
/// Returns `Ok(None)` for event types the dispatcher does not handle.
pub fn parse_event(line: &str) -> Result<Option<ReceivedEvent>> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| Error::Event(format!("not JSON: {e}")))?;

    let envelope: WireEnvelope = serde_json::from_value(value.clone())
        .map_err(|e| Error::Event(format!("bad envelope: {e}")))?;
    let wire: WireEvent =
        serde_json::from_value(value).map_err(|e| Error::Event(e.to_string()))?;

    let event: Option<Event> = wire.into();
    Ok(event.map(|event| ReceivedEvent {
        event,
        created_on: envelope.created_on,
    }))
}
