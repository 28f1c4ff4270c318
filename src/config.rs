//! Configuration loading and comment templates
//!
//! Read once at startup and immutable afterwards.

use crate::error::{Error, Result};
use crate::types::LabelDelta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Bot email used when none is configured
pub const DEFAULT_BOT_EMAIL: &str = "qabot@criteo.com";

/// Atomic topic prefix used when none is configured
pub const DEFAULT_TOPIC_PREFIX: &str = "crossrepo/";

/// Directory name under the user config dir
const CONFIG_DIR: &str = "autosubmit";

/// Filename for the config file
const CONFIG_FILE: &str = "config.toml";

/// Outcomes that produce a comment on a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// The change just joined an atomic group
    AtomicReviewDetected,
    /// The change sits on top of an unmerged ancestor
    BlockedByUnmergedAncestor,
    /// A group member has a git conflict
    BlockedByConflict,
    /// A group member depends on an unmerged commit
    BlockedByDependency,
}

impl CommentKind {
    /// Every outcome, in override-file order
    pub const ALL: [Self; 4] = [
        Self::AtomicReviewDetected,
        Self::BlockedByUnmergedAncestor,
        Self::BlockedByConflict,
        Self::BlockedByDependency,
    ];

    /// Override file name looked up in the templates directory
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::AtomicReviewDetected => "atomic_review_detected.txt",
            Self::BlockedByUnmergedAncestor => "atomic_review_same_repo.txt",
            Self::BlockedByConflict => "cantmerge_git_conflict.txt",
            Self::BlockedByDependency => "cantmerge_depends_on_non_merged.txt",
        }
    }

    /// Built-in text used when no override exists
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::AtomicReviewDetected => {
                "This review is part of a cross-repository change.\n\
                 It will be submitted once all related reviews are submittable."
            }
            Self::BlockedByUnmergedAncestor => {
                "This cross-repo review depends on a not merged commit that must be merged first."
            }
            Self::BlockedByConflict => {
                "This cross-repo review is blocked by a git conflict on change #/c/%d."
            }
            Self::BlockedByDependency => {
                "This cross-repo review is blocked by a non merged commit below #/c/%d."
            }
        }
    }
}

/// The four comment templates, resolved once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTemplates {
    atomic_review_detected: String,
    blocked_by_unmerged_ancestor: String,
    blocked_by_conflict: String,
    blocked_by_dependency: String,
}

impl Default for CommentTemplates {
    fn default() -> Self {
        Self {
            atomic_review_detected: CommentKind::AtomicReviewDetected.default_text().to_string(),
            blocked_by_unmerged_ancestor: CommentKind::BlockedByUnmergedAncestor
                .default_text()
                .to_string(),
            blocked_by_conflict: CommentKind::BlockedByConflict.default_text().to_string(),
            blocked_by_dependency: CommentKind::BlockedByDependency.default_text().to_string(),
        }
    }
}

impl CommentTemplates {
    /// Load templates, preferring override files found in `dir`.
    ///
    /// An override that exists but cannot be read is logged and the
    /// built-in text is used instead.
    pub fn load(dir: &Path) -> Self {
        let read = |kind: CommentKind| {
            let path = dir.join(kind.file_name());
            if !path.exists() {
                return kind.default_text().to_string();
            }
            match fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(path = %path.display(), "loaded comment template override");
                    content
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "not able to read comment template");
                    kind.default_text().to_string()
                }
            }
        };

        Self {
            atomic_review_detected: read(CommentKind::AtomicReviewDetected),
            blocked_by_unmerged_ancestor: read(CommentKind::BlockedByUnmergedAncestor),
            blocked_by_conflict: read(CommentKind::BlockedByConflict),
            blocked_by_dependency: read(CommentKind::BlockedByDependency),
        }
    }

    /// Raw template text for an outcome
    pub fn get(&self, kind: CommentKind) -> &str {
        match kind {
            CommentKind::AtomicReviewDetected => &self.atomic_review_detected,
            CommentKind::BlockedByUnmergedAncestor => &self.blocked_by_unmerged_ancestor,
            CommentKind::BlockedByConflict => &self.blocked_by_conflict,
            CommentKind::BlockedByDependency => &self.blocked_by_dependency,
        }
    }

    /// Template text with the change number substituted for `%d` and `{number}`
    pub fn render(&self, kind: CommentKind, number: u64) -> String {
        let n = number.to_string();
        self.get(kind).replace("%d", &n).replace("{number}", &n)
    }
}

/// Gerrit connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GerritConfig {
    /// Server root URL
    pub url: Option<String>,
    /// HTTP username of the bot account
    pub username: Option<String>,
    /// HTTP password; falls back to `GERRIT_HTTP_PASSWORD`
    #[serde(skip_serializing)]
    pub http_password: Option<String>,
}

/// Automerge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomergeConfig {
    /// Email of the bot account all reads and writes run as
    pub bot_email: String,
    /// Topic prefix marking atomic groups (case-sensitive)
    pub topic_prefix: String,
    /// Directory holding comment template overrides
    pub templates_dir: Option<PathBuf>,
    /// Vote posted with the blocked-by-ancestor comment, if any
    pub hold_label: Option<LabelDelta>,
    /// Gerrit connection settings
    pub gerrit: GerritConfig,
    /// Comment templates, resolved by [`load_config`]
    #[serde(skip)]
    pub templates: CommentTemplates,
}

impl Default for AutomergeConfig {
    fn default() -> Self {
        Self {
            bot_email: DEFAULT_BOT_EMAIL.to_string(),
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            templates_dir: None,
            hold_label: None,
            gerrit: GerritConfig::default(),
            templates: CommentTemplates::default(),
        }
    }
}

impl AutomergeConfig {
    /// Whether a topic marks an atomic group
    pub fn is_atomic_topic(&self, topic: Option<&str>) -> bool {
        topic.is_some_and(|t| t.starts_with(&self.topic_prefix))
    }

    /// Directory comment overrides are read from
    pub fn effective_templates_dir(&self) -> Option<PathBuf> {
        self.templates_dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join(CONFIG_DIR)))
    }

    fn validate(&self) -> Result<()> {
        if self.bot_email.trim().is_empty() {
            return Err(Error::Config("bot_email must not be empty".to_string()));
        }
        if self.topic_prefix.is_empty() {
            return Err(Error::Config("topic_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Default config file location (`<config dir>/autosubmit/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from disk.
///
/// Returns defaults if the file doesn't exist. Comment templates are
/// resolved here, once.
pub fn load_config(path: Option<&Path>) -> Result<AutomergeConfig> {
    let path = path.map(Path::to_path_buf).or_else(default_config_path);

    let mut config = match path {
        Some(ref p) if p.exists() => {
            let content = fs::read_to_string(p)
                .map_err(|e| Error::Config(format!("failed to read {}: {e}", p.display())))?;
            toml::from_str::<AutomergeConfig>(&content)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", p.display())))?
        }
        _ => {
            debug!("no config file found, using defaults");
            AutomergeConfig::default()
        }
    };

    config.validate()?;

    if let Some(dir) = config.effective_templates_dir() {
        config.templates = CommentTemplates::load(&dir);
    }

    debug!(
        bot_email = %config.bot_email,
        topic_prefix = %config.topic_prefix,
        "loaded configuration"
    );
    Ok(config)
}
