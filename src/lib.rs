//! autosubmit - all-or-nothing submission of cross-repository change groups
//!
//! Changes whose topic carries a configured prefix form an atomic group:
//! either every open member is submitted, or none is. The crate listens to
//! Gerrit review events, re-derives readiness from live server state on
//! every decision, and submits or comments as a bot account.
//!
//! # Architecture
//!
//! - [`dispatcher`] - maps review events to coordinator calls under one lock
//! - [`coordinator`] - the all-or-nothing decision procedure
//! - [`group`] - resolves a change's group from its topic
//! - [`oracle`] - per-change readiness questions
//! - [`executor`] - submits and comments as the bot account
//! - [`merge`] - pure group planning and the commit phase
//! - [`platform`] - the review service seam and its Gerrit implementation
//! - [`events`] - `stream-events` decoding

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod executor;
pub mod group;
pub mod merge;
pub mod oracle;
pub mod platform;
pub mod types;

pub use error::{Error, Result};
