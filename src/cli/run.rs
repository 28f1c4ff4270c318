//! Run command - feed stream-events from stdin to the dispatcher

use crate::cli::context::CommandContext;
use autosubmit::dispatcher::{Disposition, EventDispatcher};
use autosubmit::error::Result;
use autosubmit::events::parse_event;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Dispatch every event line read from stdin until EOF
///
/// Undecodable lines, including ones that are not UTF-8, are logged and
/// skipped.
pub async fn run_events(config_path: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::new(config_path)?;
    let dispatcher = EventDispatcher::new(ctx.service, ctx.config);
    dispatcher.start().await?;

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    let mut handled = 0_u64;
    let mut failed = 0_u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "skipping event line that is not UTF-8");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let received = match parse_event(line) {
            Ok(Some(received)) => received,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping undecodable event");
                continue;
            }
        };

        debug!(created_on = ?received.created_on, "decoded event");
        match dispatcher.on_event(&received.event).await {
            Disposition::Handled => handled += 1,
            Disposition::Failed => failed += 1,
            Disposition::Stopped | Disposition::Ignored | Disposition::Echo => {}
        }
    }

    dispatcher.stop();
    info!(handled, failed, "event stream closed");
    Ok(())
}
