use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use herald_core::{fingerprint, resolve_key, Store};
use herald_models::ContentKind;
use herald_sources::{EpisodeFilter, MediaServer};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::commands::load_context;
use crate::output::Output;

const PAGE_SIZE: u32 = 500;

/// Record the whole existing catalog as announced, without notifying.
pub async fn run_baseline(out: &Output) -> Result<()> {
    let ctx = load_context()?;
    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;
    let store = Store::connect(&ctx.database_path())
        .await
        .map_err(|e| eyre!("Failed to open ledger database: {}", e))?;
    let now = Utc::now();

    for kind in [
        ContentKind::Movie,
        ContentKind::Album,
        ContentKind::Book,
        ContentKind::MusicVideo,
    ] {
        let count = baseline_ledger_kind(&ctx.server, &store, kind, out).await?;
        out.success(format!("{}: {} items recorded", kind.wire_name(), count));
    }

    let seasons = baseline_seasons(&ctx.server, &store, out).await?;
    out.success(format!("Season: {} seasons recorded", seasons));

    store
        .set_meta("baselined_at", &now.to_rfc3339())
        .await
        .map_err(|e| eyre!("Failed to record baseline marker: {}", e))?;
    store.close().await;
    out.success("Baseline complete; future arrivals will be announced");
    Ok(())
}

fn progress_bar(total: u32, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg:>12} [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(label.to_string());
    bar
}

async fn baseline_ledger_kind(
    server: &impl MediaServer,
    store: &Store,
    kind: ContentKind,
    _out: &Output,
) -> Result<u64> {
    let now = Utc::now();
    let mut recorded = 0u64;
    let mut start_index = 0u32;
    let mut bar: Option<ProgressBar> = None;

    loop {
        let page = server
            .list_items(kind, start_index, PAGE_SIZE)
            .await
            .map_err(|e| eyre!("Failed to list {} items: {}", kind.wire_name(), e))?;
        if page.items.is_empty() {
            break;
        }
        let bar = bar.get_or_insert_with(|| progress_bar(page.total, kind.wire_name()));
        let page_len = page.items.len() as u32;

        for item in page.items {
            bar.inc(1);
            let Some(key) = resolve_key(&item) else {
                warn!(item_id = %item.id, name = %item.name, "Skipping item without identity");
                continue;
            };
            let snapshot = fingerprint(&item);
            store.store_snapshot(&item.id, &key, &snapshot, now).await?;
            store
                .mark_announced(
                    kind,
                    &key,
                    Some(&item.id),
                    Some(&item.display_title()),
                    item.year,
                    now,
                )
                .await?;
            recorded += 1;
        }

        start_index += page_len;
        if start_index >= page.total {
            break;
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(recorded)
}

async fn baseline_seasons(server: &impl MediaServer, store: &Store, _out: &Output) -> Result<u64> {
    let now = Utc::now();
    let mut recorded = 0u64;
    let mut start_index = 0u32;
    let mut bar: Option<ProgressBar> = None;

    loop {
        let page = server
            .list_items(ContentKind::Season, start_index, PAGE_SIZE)
            .await
            .map_err(|e| eyre!("Failed to list seasons: {}", e))?;
        if page.items.is_empty() {
            break;
        }
        let bar = bar.get_or_insert_with(|| progress_bar(page.total, "Season"));
        let page_len = page.items.len() as u32;

        for item in page.items {
            bar.inc(1);
            let present = match server.count_episodes(&item.id, EpisodeFilter::Present).await {
                Ok(count) => count as i64,
                Err(e) => {
                    warn!(season_id = %item.id, error = %e, "Episode count failed, skipping season");
                    continue;
                }
            };
            let missing = server
                .count_episodes(&item.id, EpisodeFilter::Missing)
                .await
                .unwrap_or(0) as i64;

            store
                .upsert_season_progress(
                    &item.id,
                    item.series_id.as_deref(),
                    item.series_name.as_deref(),
                    item.season_number,
                    item.year,
                    present,
                    present + missing,
                    true,
                    now,
                )
                .await?;
            recorded += 1;
        }

        start_index += page_len;
        if start_index >= page.total {
            break;
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(recorded)
}
