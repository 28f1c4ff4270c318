//! Shared command context for CLI commands

use autosubmit::auth::get_gerrit_auth;
use autosubmit::config::{AutomergeConfig, load_config};
use autosubmit::error::Result;
use autosubmit::platform::{GerritService, ReviewService};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Configuration plus a connected review service
///
/// Shared by `run` and `check`; `config` only needs the configuration and
/// never builds a service.
pub struct CommandContext {
    /// Immutable configuration
    pub config: Arc<AutomergeConfig>,
    /// Gerrit REST service
    pub service: Arc<dyn ReviewService>,
}

impl CommandContext {
    /// Load configuration and connect to Gerrit
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let auth = get_gerrit_auth(&config.gerrit)?;
        debug!(url = %auth.url, username = %auth.username, source = ?auth.source, "using Gerrit credentials");

        let service = GerritService::new(&auth.url, auth.username, auth.password)?;
        Ok(Self {
            config: Arc::new(config),
            service: Arc::new(service),
        })
    }
}
