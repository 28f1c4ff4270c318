//! Merge executor - submits changes and comments on them as the bot

use crate::error::{Error, Result};
use crate::oracle::ReadinessOracle;
use crate::platform::ReviewService;
use crate::types::LabelDelta;
use std::sync::Arc;
use tracing::debug;

/// Prefix put in front of every message this bot posts.
///
/// The event dispatcher uses it to recognise the bot's own comments and
/// avoid re-triggering itself.
pub const COMMENTS_PREFIX: &str = "[Autosubmitter] ";

/// Performs the bot's write operations against the review service
#[derive(Clone)]
pub struct MergeExecutor {
    service: Arc<dyn ReviewService>,
    oracle: ReadinessOracle,
}

impl MergeExecutor {
    /// Create a new executor
    pub fn new(service: Arc<dyn ReviewService>, oracle: ReadinessOracle) -> Self {
        Self { service, oracle }
    }

    /// Submit a change as the bot
    ///
    /// Bot-account errors propagate unchanged; remote submit errors become
    /// [`Error::Submit`].
    pub async fn merge(&self, project: &str, number: u64) -> Result<()> {
        let actor = self.oracle.bot_account().await?;
        // Resolve the current revision as the bot before acting on it
        self.oracle.lookup(project, number).await?;

        debug!(project, change = number, %actor, "submitting");
        self.service
            .submit(project, number, actor)
            .await
            .map_err(|e| Error::Submit {
                change: number,
                message: e.to_string(),
            })
    }

    /// Post a prefixed message as the bot, optionally with a label vote
    pub async fn comment_on_review(
        &self,
        project: &str,
        number: u64,
        text: &str,
        label: Option<&LabelDelta>,
    ) -> Result<()> {
        let actor = self.oracle.bot_account().await?;
        let message = format!("{COMMENTS_PREFIX}{text}");

        debug!(project, change = number, %actor, "commenting on review");
        self.service
            .post_review(project, number, actor, &message, label)
            .await
            .map_err(|e| Error::ReviewUpdate {
                change: number,
                message: e.to_string(),
            })
    }
}
