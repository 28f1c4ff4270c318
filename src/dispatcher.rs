//! Event dispatcher - maps review events to coordinator calls
//!
//! Every coordinator decision runs under one process-wide lock, so two
//! members of the same group reaching "submittable" at once cannot both
//! decide to submit it. The lock is not reentrant: a handler never calls
//! another locked handler.

use crate::config::AutomergeConfig;
use crate::coordinator::{AtomicCoordinator, MembershipNotice, SubmitOutcome};
use crate::error::Result;
use crate::events::{Approval, Event, branch_of_ref};
use crate::executor::COMMENTS_PREFIX;
use crate::platform::ReviewService;
use crate::types::{ChangeQuery, ChangeSummary};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// What the dispatcher did with one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The dispatcher is stopped; event dropped
    Stopped,
    /// Nothing to do for this event
    Ignored,
    /// The bot's own comment; discarded by the echo filter
    Echo,
    /// Coordinator ran to completion
    Handled,
    /// Coordinator failed; the failure was logged
    Failed,
}

/// Whether a comment event was produced by the bot itself
///
/// Only comments authored by the bot account are candidates. Among those,
/// a comment is an echo if it carries the bot's prefix marker, or if the
/// only vote it changed is the configured hold vote.
pub fn is_own_comment(
    config: &AutomergeConfig,
    author_email: Option<&str>,
    comment: &str,
    approvals: &[Approval],
) -> bool {
    let from_bot = author_email.is_some_and(|email| email.eq_ignore_ascii_case(&config.bot_email));
    if !from_bot {
        return false;
    }
    if comment.contains(COMMENTS_PREFIX) {
        return true;
    }

    let Some(hold) = &config.hold_label else {
        return false;
    };
    let deltas: Vec<&Approval> = approvals.iter().filter(|a| a.is_delta()).collect();
    matches!(deltas.as_slice(), [only] if only.label == hold.name && only.value == hold.value)
}

/// Routes review events to the atomic coordinator
pub struct EventDispatcher {
    service: Arc<dyn ReviewService>,
    config: Arc<AutomergeConfig>,
    coordinator: AtomicCoordinator,
    lock: Mutex<()>,
    running: AtomicBool,
}

impl EventDispatcher {
    /// Create a stopped dispatcher
    pub fn new(service: Arc<dyn ReviewService>, config: Arc<AutomergeConfig>) -> Self {
        let coordinator = AtomicCoordinator::new(Arc::clone(&service), Arc::clone(&config));
        Self {
            service,
            config,
            coordinator,
            lock: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    /// The coordinator events are routed to
    pub const fn coordinator(&self) -> &AtomicCoordinator {
        &self.coordinator
    }

    /// Start accepting events
    ///
    /// Resolves the bot account first, so a missing or ambiguous account
    /// fails here instead of on the first event.
    pub async fn start(&self) -> Result<()> {
        let account = self.coordinator.oracle().bot_account().await?;
        self.running.store(true, Ordering::SeqCst);
        info!(
            bot_email = %self.config.bot_email,
            %account,
            topic_prefix = %self.config.topic_prefix,
            "event dispatcher started"
        );
        Ok(())
    }

    /// Stop accepting events; handlers already running finish
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("event dispatcher stopped");
        }
    }

    /// Whether the dispatcher accepts events
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle one event
    ///
    /// Never fails: coordinator errors are logged with the change they
    /// concern and reported as [`Disposition::Failed`].
    pub async fn on_event(&self, event: &Event) -> Disposition {
        if !self.is_running() {
            warn!(event = %event, "dispatcher not running, dropping event");
            return Disposition::Stopped;
        }
        debug!(event = %event, "received event");

        match event {
            Event::PatchSetCreated { change } | Event::ReviewerDeleted { change } => {
                self.on_new_or_changed_patchset(change).await
            }
            Event::TopicChanged { change, old_topic } => {
                self.on_topic_changed(change, old_topic.as_deref()).await
            }
            Event::CommentAdded {
                change,
                author_email,
                comment,
                approvals,
            } => {
                if is_own_comment(&self.config, author_email.as_deref(), comment, approvals) {
                    debug!(change = change.number, "ignoring own comment");
                    return Disposition::Echo;
                }
                self.on_comment_added(change).await
            }
            Event::RefUpdated { project, ref_name } => self.on_ref_updated(project, ref_name).await,
        }
    }

    async fn on_new_or_changed_patchset(&self, change: &ChangeSummary) -> Disposition {
        let _guard = self.lock.lock().await;

        if let Err(e) = self.notify_locked(change).await {
            error!(
                project = %change.project,
                change = change.number,
                error = %e,
                "failed to notify new atomic group member"
            );
        }
        self.submit_locked(change).await
    }

    async fn on_topic_changed(&self, change: &ChangeSummary, old_topic: Option<&str>) -> Disposition {
        if !self.config.is_atomic_topic(change.topic.as_deref()) {
            debug!(change = change.number, ?old_topic, "topic is not atomic");
            return Disposition::Ignored;
        }

        let _guard = self.lock.lock().await;
        match self.notify_locked(change).await {
            Ok(_) => Disposition::Handled,
            Err(e) => {
                error!(
                    project = %change.project,
                    change = change.number,
                    error = %e,
                    "failed to notify new atomic group member"
                );
                Disposition::Failed
            }
        }
    }

    async fn on_comment_added(&self, change: &ChangeSummary) -> Disposition {
        let _guard = self.lock.lock().await;

        if let Err(e) = self
            .coordinator
            .oracle()
            .lookup(&change.project, change.number)
            .await
        {
            error!(
                project = %change.project,
                change = change.number,
                error = %e,
                "commented review no longer exists"
            );
            return Disposition::Failed;
        }
        self.submit_locked(change).await
    }

    /// Re-evaluate every submittable change on the updated branch
    ///
    /// The query runs unlocked; each attempt takes the lock in turn. One
    /// failing change does not stop the others.
    async fn on_ref_updated(&self, project: &str, ref_name: &str) -> Disposition {
        let Some(branch) = branch_of_ref(ref_name) else {
            debug!(project, ref_name, "not a branch ref");
            return Disposition::Ignored;
        };

        let query = ChangeQuery::SubmittableOnBranch {
            project: project.to_string(),
            branch: branch.to_string(),
        };
        let candidates = match self.service.query_changes(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(project, branch, error = %e, "cannot query submittable changes");
                return Disposition::Failed;
            }
        };

        let mut failed = 0_usize;
        for candidate in candidates {
            let change = candidate.summary();
            info!(
                project,
                branch,
                change = change.number,
                "found another submittable change, submitting"
            );
            let _guard = self.lock.lock().await;
            if self.submit_locked(&change).await == Disposition::Failed {
                failed += 1;
            }
        }

        if failed == 0 {
            Disposition::Handled
        } else {
            warn!(project, branch, failed, "some changes could not be submitted");
            Disposition::Failed
        }
    }

    /// Caller holds the lock
    async fn notify_locked(&self, change: &ChangeSummary) -> Result<MembershipNotice> {
        let notice = self.coordinator.notify_new_membership(change).await?;
        debug!(change = change.number, ?notice, "membership notification");
        Ok(notice)
    }

    /// Caller holds the lock
    async fn submit_locked(&self, change: &ChangeSummary) -> Disposition {
        match self.coordinator.attempt_submit(change).await {
            Ok(SubmitOutcome::PartiallySubmitted {
                merged,
                failed,
                error,
            }) => {
                error!(
                    project = %change.project,
                    change = change.number,
                    ?merged,
                    failed,
                    %error,
                    "group left partially submitted"
                );
                Disposition::Failed
            }
            Ok(outcome) => {
                debug!(change = change.number, ?outcome, "submit attempt finished");
                Disposition::Handled
            }
            Err(e) => {
                if e.is_configuration() {
                    error!(change = change.number, error = %e, "bot account is misconfigured");
                } else {
                    error!(
                        project = %change.project,
                        change = change.number,
                        error = %e,
                        "an error occurred while trying to merge change"
                    );
                }
                Disposition::Failed
            }
        }
    }
}
