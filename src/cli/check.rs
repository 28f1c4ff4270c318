//! Check command - show what the bot thinks of one change

use crate::cli::context::CommandContext;
use autosubmit::error::Result;
use autosubmit::oracle::ReadinessOracle;
use std::path::Path;

/// Print the readiness verdict for `project`/`number`
pub async fn run_check(config_path: Option<&Path>, project: &str, number: u64) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let oracle = ReadinessOracle::new(ctx.service, ctx.config);

    let change = oracle.lookup(project, number).await?.summary();
    let verdict = oracle.verdict(&change).await?;

    println!("{change} ({})", change.topic.as_deref().unwrap_or("no topic"));
    println!("  atomic:      {}", verdict.is_atomic_topic);
    println!("  submittable: {}", verdict.is_submittable);
    println!("  dependent:   {}", verdict.has_unmerged_ancestor);
    Ok(())
}
