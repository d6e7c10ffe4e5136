//! Background pollers.
//!
//! One independent loop per content kind, each a plain "work, sleep a fixed
//! interval, repeat" cycle. The loops share nothing but the ledger; a slow
//! collaborator call inside one cycle only delays that loop. Failures are
//! isolated per candidate so one bad record never kills a loop.

use chrono::{Duration as ChronoDuration, Utc};
use herald_models::ContentKind;
use herald_sources::MediaServer;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::{Engine, Origin, Outcome};

/// The closed set of poller loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Movies,
    Seasons,
    EpisodeQuality,
    Albums,
    Books,
    MusicVideos,
}

impl PollKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Seasons => "seasons",
            Self::EpisodeQuality => "episode-quality",
            Self::Albums => "albums",
            Self::Books => "books",
            Self::MusicVideos => "music-videos",
        }
    }

    /// What the loop pages through. The episode-quality loop walks seasons
    /// and descends into their episodes itself.
    fn listed_kind(&self) -> ContentKind {
        match self {
            Self::Movies => ContentKind::Movie,
            Self::Seasons | Self::EpisodeQuality => ContentKind::Season,
            Self::Albums => ContentKind::Album,
            Self::Books => ContentKind::Book,
            Self::MusicVideos => ContentKind::MusicVideo,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub page_size: u32,
    /// Candidates younger than this are left to the webhook path.
    pub new_item_grace: ChronoDuration,
    pub wait_for_scan_idle: bool,
    /// `None` means wait for idle indefinitely.
    pub scan_idle_timeout: Option<Duration>,
}

/// Summary of one poll cycle, logged in one line per cycle.
#[derive(Debug, Default)]
struct CycleStats {
    scanned: usize,
    announced: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
}

/// Run one poller until the token cancels. Never returns early on errors;
/// a failed cycle logs and waits for the next interval.
pub async fn run_poller(
    engine: Arc<Engine>,
    kind: PollKind,
    settings: PollerSettings,
    cancel: CancellationToken,
) {
    info!(
        poller = kind.label(),
        interval_secs = settings.interval.as_secs(),
        "Poller started"
    );
    loop {
        if settings.wait_for_scan_idle {
            wait_for_scan_idle(
                engine.server().as_ref(),
                settings.scan_idle_timeout,
                &cancel,
            )
            .await;
        }
        if cancel.is_cancelled() {
            break;
        }

        let stats = run_cycle(&engine, kind, &settings, &cancel).await;
        info!(
            poller = kind.label(),
            scanned = stats.scanned,
            announced = stats.announced,
            updated = stats.updated,
            skipped = stats.skipped,
            failed = stats.failed,
            "Poll cycle finished"
        );

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(settings.interval) => {}
        }
    }
    info!(poller = kind.label(), "Poller stopped");
}

async fn run_cycle(
    engine: &Engine,
    kind: PollKind,
    settings: &PollerSettings,
    cancel: &CancellationToken,
) -> CycleStats {
    let mut stats = CycleStats::default();
    let listed = kind.listed_kind();
    let now = Utc::now();
    let mut start_index = 0u32;

    loop {
        if cancel.is_cancelled() {
            break;
        }
        let page = match engine
            .server()
            .list_items(listed, start_index, settings.page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                error!(poller = kind.label(), error = %e, "Catalog page fetch failed");
                break;
            }
        };
        if page.items.is_empty() {
            break;
        }
        let page_len = page.items.len() as u32;

        for item in &page.items {
            if cancel.is_cancelled() {
                break;
            }
            stats.scanned += 1;

            // Leave fresh arrivals to the webhook: the server may still be
            // parsing their streams
            if let Some(created) = item.date_created {
                if now - created < settings.new_item_grace {
                    stats.skipped += 1;
                    continue;
                }
            }

            let result = if kind == PollKind::EpisodeQuality {
                match engine.server().list_episodes(&item.id).await {
                    Ok(episodes) => engine.check_season_quality(item, &episodes).await,
                    Err(e) => {
                        warn!(season_id = %item.id, error = %e, "Episode listing failed");
                        stats.failed += 1;
                        continue;
                    }
                }
            } else {
                engine.handle_candidate(item, Origin::Poller).await
            };

            match result {
                Ok(Outcome::New) | Ok(Outcome::SeasonProgress { .. }) => stats.announced += 1,
                Ok(Outcome::QualityUpdate) => stats.updated += 1,
                Ok(_) => stats.skipped += 1,
                Err(e) => {
                    // Per-candidate isolation: log and keep going
                    warn!(
                        poller = kind.label(),
                        item_id = %item.id,
                        name = %item.name,
                        error = %e,
                        "Candidate failed"
                    );
                    stats.failed += 1;
                }
            }
        }

        start_index += page_len;
        if start_index >= page.total {
            break;
        }
    }
    stats
}

/// Advisory gate: hold the cycle while the server reports a library scan,
/// up to the configured cap. Reduces (does not eliminate) false quality
/// reads during a bulk re-scan.
async fn wait_for_scan_idle(
    server: &dyn MediaServer,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) {
    let started = std::time::Instant::now();
    loop {
        if cancel.is_cancelled() {
            return;
        }
        match server.is_scanning().await {
            Ok(false) => return,
            Ok(true) => {
                if let Some(cap) = timeout {
                    if started.elapsed() >= cap {
                        debug!("Scan-idle wait timed out, proceeding anyway");
                        return;
                    }
                }
                debug!("Library scan in progress, delaying poll cycle");
            }
            // The gate is advisory; an unreachable flag must not block work
            Err(e) => {
                warn!(error = %e, "Scan state check failed, proceeding");
                return;
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(30)) => {}
        }
    }
}
