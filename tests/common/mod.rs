//! Shared test fixtures

#![allow(dead_code)]

mod mock_review;

pub use mock_review::{MockReviewService, ReviewCall, SubmitCall};

use autosubmit::config::AutomergeConfig;
use autosubmit::types::{
    ChangeInfo, ChangeStatus, ChangeSummary, LabelDelta, RequirementStatus,
    SubmitRequirementResult,
};
use std::sync::Arc;

pub const BOT_EMAIL: &str = "bot@example.com";
pub const GROUP_TOPIC: &str = "crossrepo/feature-x";

/// Config with a known bot email and a `Code-Review-1` hold vote
pub fn test_config() -> Arc<AutomergeConfig> {
    Arc::new(AutomergeConfig {
        bot_email: BOT_EMAIL.to_string(),
        hold_label: Some(LabelDelta {
            name: "Code-Review".to_string(),
            value: -1,
        }),
        ..AutomergeConfig::default()
    })
}

/// An open change on `master` with every requirement satisfied
pub fn make_change(project: &str, number: u64, topic: Option<&str>) -> ChangeInfo {
    ChangeInfo {
        project: project.to_string(),
        number,
        id: format!("I{number:040}"),
        topic: topic.map(String::from),
        branch: "master".to_string(),
        status: ChangeStatus::New,
        current_revision: Some(format!("rev-{number}")),
        submit_requirements: vec![
            SubmitRequirementResult {
                name: "Code-Review".to_string(),
                status: RequirementStatus::Satisfied,
            },
            SubmitRequirementResult {
                name: "Verified".to_string(),
                status: RequirementStatus::Satisfied,
            },
        ],
    }
}

/// Same as [`make_change`] but still missing a Code-Review vote
pub fn make_unapproved_change(project: &str, number: u64, topic: Option<&str>) -> ChangeInfo {
    let mut change = make_change(project, number, topic);
    change.submit_requirements[0].status = RequirementStatus::Unsatisfied;
    change
}

/// Summary as an event would carry it
pub fn summary(change: &ChangeInfo) -> ChangeSummary {
    change.summary()
}
