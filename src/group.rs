//! Atomic group resolution

use crate::error::Result;
use crate::oracle::ReadinessOracle;
use crate::platform::ReviewService;
use crate::types::{ChangeInfo, ChangeQuery, ChangeSummary};
use std::sync::Arc;
use tracing::debug;

/// Resolves the atomic group a change belongs to
///
/// Groups are recomputed on every call; nothing is cached.
#[derive(Clone)]
pub struct GroupResolver {
    service: Arc<dyn ReviewService>,
    oracle: ReadinessOracle,
}

impl GroupResolver {
    /// Create a new resolver
    pub fn new(service: Arc<dyn ReviewService>, oracle: ReadinessOracle) -> Self {
        Self { service, oracle }
    }

    /// Compute the group of `change`
    ///
    /// A change without an atomic topic is its own singleton group.
    /// Otherwise the group is every open change carrying the same topic,
    /// as the service reports it now. The result may not contain `change`
    /// itself if it is no longer open; no member order is guaranteed.
    pub async fn resolve_group(&self, change: &ChangeSummary) -> Result<Vec<ChangeSummary>> {
        let topic = match change.topic.as_deref() {
            Some(topic) if self.oracle.is_atomic_review(change) => topic,
            _ => return Ok(vec![change.clone()]),
        };

        let members: Vec<ChangeInfo> = self
            .service
            .query_changes(&ChangeQuery::OpenWithTopic(topic.to_string()))
            .await?;

        let group: Vec<ChangeSummary> = members
            .iter()
            // membership is exact topic equality
            .filter(|m| m.topic.as_deref() == Some(topic))
            .map(ChangeInfo::summary)
            .collect();

        debug!(
            change = change.number,
            topic,
            members = group.len(),
            "resolved atomic group"
        );
        Ok(group)
    }
}
