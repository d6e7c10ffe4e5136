//! Resilient season episode counting.
//!
//! Right after an import the server may not have finished indexing a
//! season's files, briefly reporting zero present episodes. The counter
//! retries with backoff before believing a zero, so a transient empty read
//! does not masquerade as "nothing new".

use herald_sources::{EpisodeFilter, MediaServer, SourceError};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeCounts {
    /// Episodes with an on-disk file.
    pub present: i64,
    /// Present plus missing-but-expected.
    pub total: i64,
}

pub async fn resilient_episode_counts(
    server: &dyn MediaServer,
    season_id: &str,
    attempts: u32,
    backoff: Duration,
) -> Result<EpisodeCounts, SourceError> {
    let attempts = attempts.max(1);
    let mut last_ok: Option<EpisodeCounts> = None;

    for attempt in 1..attempts {
        match fetch_counts(server, season_id).await {
            Ok(counts) if counts.present > 0 => return Ok(counts),
            Ok(counts) => {
                debug!(
                    season_id,
                    attempt, "Season reported zero present episodes, retrying"
                );
                last_ok = Some(counts);
            }
            Err(e) => {
                warn!(season_id, attempt, error = %e, "Episode count fetch failed, retrying");
            }
        }
        tokio::time::sleep(backoff * attempt).await;
    }

    // Final attempt: believe whatever comes back, falling back to the last
    // good (zero) read if this one errors
    match fetch_counts(server, season_id).await {
        Ok(counts) => Ok(counts),
        Err(e) => match last_ok {
            Some(counts) => Ok(counts),
            None => Err(e),
        },
    }
}

async fn fetch_counts(
    server: &dyn MediaServer,
    season_id: &str,
) -> Result<EpisodeCounts, SourceError> {
    let present = server
        .count_episodes(season_id, EpisodeFilter::Present)
        .await? as i64;
    let missing = server
        .count_episodes(season_id, EpisodeFilter::Missing)
        .await? as i64;
    Ok(EpisodeCounts {
        present,
        total: present + missing,
    })
}
