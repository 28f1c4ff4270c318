//! CLI commands
//!
//! Command implementations for the `autosubmit` binary.

mod check;
mod config;
mod context;
mod run;

pub use check::run_check;
pub use config::run_show_config;
pub use run::run_events;
