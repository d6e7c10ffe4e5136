//! Ledger garbage collection.
//!
//! The catalog and the ledger drift apart over time (deletions, renames,
//! key changes when an external id shows up late). The sweep pages the live
//! catalog, then removes ledger rows that no longer correspond to anything
//! and have aged past the grace period.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use herald_models::ContentKind;
use herald_sources::MediaServer;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::logical_key::resolve_key;
use crate::store::{GcCounts, Store};

const GC_PAGE_SIZE: u32 = 500;

/// One full sweep. Collaborator failures abort the sweep (better to keep
/// stale rows than to delete live ones off an incomplete listing).
pub async fn run_gc_cycle(
    store: &Store,
    server: &dyn MediaServer,
    grace: ChronoDuration,
    now: DateTime<Utc>,
) -> anyhow::Result<GcCounts> {
    let cutoff = now - grace;
    let mut counts = GcCounts::default();

    let mut live_item_ids: HashSet<String> = HashSet::new();
    // content_quality mixes every kind's keys in one table, so the live set
    // for it must span all kinds before any row is judged dead
    let mut live_content_keys: HashSet<String> = HashSet::new();

    for kind in [
        ContentKind::Movie,
        ContentKind::Album,
        ContentKind::Book,
        ContentKind::MusicVideo,
    ] {
        let mut kind_keys: HashSet<String> = HashSet::new();
        collect_live(server, kind, &mut kind_keys, &mut live_item_ids).await?;
        counts.announced += store.gc_announced(kind, &kind_keys, cutoff).await?;
        live_content_keys.extend(kind_keys);
    }

    let mut season_ids: HashSet<String> = HashSet::new();
    collect_live(server, ContentKind::Season, &mut season_ids, &mut live_item_ids).await?;
    let (progress, quality) = store.gc_seasons(&season_ids, cutoff).await?;
    counts.season_progress = progress;
    counts.season_quality = quality;

    // Episodes carry media_quality rows and season-scoped content keys
    collect_live(
        server,
        ContentKind::Episode,
        &mut live_content_keys,
        &mut live_item_ids,
    )
    .await?;

    counts.content_quality = store
        .gc_content_quality(&live_content_keys, cutoff)
        .await?;
    counts.media_quality = store.gc_media_quality(&live_item_ids, cutoff).await?;

    Ok(counts)
}

async fn collect_live(
    server: &dyn MediaServer,
    kind: ContentKind,
    live_keys: &mut HashSet<String>,
    live_item_ids: &mut HashSet<String>,
) -> anyhow::Result<()> {
    let mut start_index = 0u32;
    loop {
        let page = server.list_items(kind, start_index, GC_PAGE_SIZE).await?;
        if page.items.is_empty() {
            break;
        }
        let page_len = page.items.len() as u32;
        for item in page.items {
            live_item_ids.insert(item.id.clone());
            match kind {
                ContentKind::Season => {
                    live_keys.insert(item.id.clone());
                }
                // Episode content keys are season-scoped, mirroring how the
                // engine builds them
                ContentKind::Episode => {
                    if let Some(season_id) = &item.season_id {
                        let number = item.episode_number.unwrap_or(-1);
                        live_keys.insert(format!("episode:{}:e{}", season_id, number));
                    }
                }
                _ => {
                    if let Some(key) = resolve_key(&item) {
                        live_keys.insert(key.into_string());
                    } else {
                        warn!(item_id = %item.id, "Catalog item without derivable key, sparing its rows");
                    }
                }
            }
        }
        start_index += page_len;
        if start_index >= page.total {
            break;
        }
    }
    Ok(())
}

/// The sweep loop: one cycle per interval until cancelled.
pub async fn run_gc_loop(
    store: Store,
    server: Arc<dyn MediaServer>,
    grace: ChronoDuration,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!(
        interval_secs = interval.as_secs(),
        grace_days = grace.num_days(),
        "Garbage collection loop started"
    );
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        match run_gc_cycle(&store, server.as_ref(), grace, Utc::now()).await {
            Ok(counts) => {
                if counts.total() > 0 {
                    info!(
                        removed = counts.total(),
                        content_quality = counts.content_quality,
                        media_quality = counts.media_quality,
                        announced = counts.announced,
                        season_progress = counts.season_progress,
                        "Garbage collection removed stale ledger rows"
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "Garbage collection cycle failed");
            }
        }
    }
    info!("Garbage collection loop stopped");
}
