use crate::context::CatalogContext;
use crate::output::Output;
use catalog_sync_core::{AppliedChange, EventOutcome};
use color_eyre::Result;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

fn describe(change: &AppliedChange) -> String {
    match change.outcome {
        EventOutcome::Inserted(id) => format!("{} #{} added", change.collection, id),
        EventOutcome::Replaced(id) => format!("{} #{} updated", change.collection, id),
        EventOutcome::Removed(id) => format!("{} #{} removed", change.collection, id),
        EventOutcome::Dropped => format!("{} {} event ignored", change.collection, change.kind),
    }
}

pub async fn run_watch(output: &Output) -> Result<()> {
    let ctx = CatalogContext::open_loaded(output).await?;
    if !ctx.config.sync.live_updates {
        output.warn("Live updates are disabled (sync.live_updates = false)");
        ctx.sync.teardown();
        return Ok(());
    }

    let mut changes = ctx.sync.watch_changes();
    let attached = ctx.sync.attach().await;
    if attached == 0 {
        ctx.sync.teardown();
        return Err(color_eyre::eyre::eyre!("Could not subscribe to catalog changes"));
    }
    info!(operation = "watch_started", subscriptions = attached, "Watching catalog changes");
    output.info(format!(
        "Watching {} collection(s) on the {} backend. Press Ctrl-C to stop.",
        attached,
        ctx.sync.backend_name()
    ));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = changes.recv() => match received {
                Ok(change) => {
                    if output.is_human() {
                        output.info(describe(&change));
                    } else {
                        output.json(&json!({
                            "type": "change",
                            "collection": change.collection,
                            "kind": change.kind,
                            "applied": change.outcome.is_applied(),
                            "id": match change.outcome {
                                EventOutcome::Inserted(id) | EventOutcome::Replaced(id) | EventOutcome::Removed(id) => Some(id),
                                EventOutcome::Dropped => None,
                            },
                        }));
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(operation = "watch_lagged", missed = missed, "Change listener fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    let released = ctx.sync.detach();
    ctx.sync.teardown();
    info!(operation = "watch_stopped", released = released, "Stopped watching catalog changes");
    output.success("Stopped watching");
    Ok(())
}
