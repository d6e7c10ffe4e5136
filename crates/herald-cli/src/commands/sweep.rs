use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use herald_core::{gc, Store};

use crate::commands::load_context;
use crate::output::Output;

pub async fn run_sweep(out: &Output) -> Result<()> {
    let ctx = load_context()?;
    let store = Store::connect(&ctx.database_path())
        .await
        .map_err(|e| eyre!("Failed to open ledger database: {}", e))?;

    let grace = chrono::Duration::days(ctx.config.gc.grace_days);
    let counts = gc::run_gc_cycle(&store, &ctx.server, grace, Utc::now())
        .await
        .map_err(|e| eyre!("Garbage collection failed: {}", e))?;

    out.success(format!(
        "Removed {} stale rows (quality: {}, file history: {}, announced: {}, seasons: {})",
        counts.total(),
        counts.content_quality,
        counts.media_quality,
        counts.announced,
        counts.season_progress + counts.season_quality,
    ));
    store.close().await;
    Ok(())
}
