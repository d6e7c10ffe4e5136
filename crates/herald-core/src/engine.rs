//! The reconciliation engine.
//!
//! Both observation paths (webhook and pollers) funnel every candidate
//! through [`Engine::handle_candidate`], which consults the ledger, quality
//! tracker, progress tracker, and suppression window to decide between
//! "new", "quality update", "season progress", suppression, and no-op —
//! then updates the stores so the overlapping path stays silent.

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use herald_config::NotifyConfig;
use herald_models::{ContentKind, LogicalKey, MediaItem, WebhookPayload};
use herald_sources::{MediaServer, Notifier};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::enrichment::Enrichment;
use crate::kinds::{kind_spec, KindSpec};
use crate::render;
use crate::season::resilient_episode_counts;
use crate::store::Store;

/// Which observation path produced a candidate. Only the webhook path
/// consults the suppression window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Webhook,
    Poller,
}

/// What the engine decided for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Genuinely new: announced and marked in the ledger.
    New,
    /// Material quality change: announced and suppression touched.
    QualityUpdate,
    /// Season net increase: announced and watermark advanced.
    SeasonProgress { present: i64, total: i64 },
    /// Webhook observation of an event the poller just announced.
    Suppressed,
    /// Ledger already covers this logical entity; nothing changed.
    AlreadyAnnounced,
    /// Recorded without notifying (pre-ledger cutoff or first-sight policy).
    Baseline,
    /// Candidate outside this engine's remit.
    Skipped(&'static str),
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub suppression_window: Duration,
    pub season_announce_on_first_sight: bool,
    pub episode_premiered_within: Duration,
    pub season_added_within: Duration,
    pub episode_count_attempts: u32,
    pub episode_count_backoff: std::time::Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            suppression_window: Duration::minutes(30),
            season_announce_on_first_sight: false,
            episode_premiered_within: Duration::days(14),
            season_added_within: Duration::days(3),
            episode_count_attempts: 4,
            episode_count_backoff: std::time::Duration::from_secs(5),
        }
    }
}

impl EngineOptions {
    pub fn from_notify_config(config: &NotifyConfig) -> Self {
        Self {
            suppression_window: Duration::minutes(config.suppression_window_minutes),
            season_announce_on_first_sight: config.season_announce_on_first_sight,
            episode_premiered_within: Duration::days(config.episode_premiered_within_days),
            season_added_within: Duration::days(config.season_added_within_days),
            ..Default::default()
        }
    }
}

pub struct Engine {
    store: Store,
    server: Arc<dyn MediaServer>,
    notifiers: Vec<Arc<dyn Notifier>>,
    enrichment: Enrichment,
    options: EngineOptions,
    db_created_at: DateTime<Utc>,
}

impl Engine {
    pub async fn new(
        store: Store,
        server: Arc<dyn MediaServer>,
        notifiers: Vec<Arc<dyn Notifier>>,
        enrichment: Enrichment,
        options: EngineOptions,
    ) -> anyhow::Result<Self> {
        let db_created_at = store
            .db_created_at(Utc::now())
            .await
            .context("failed to read ledger creation timestamp")?;
        Ok(Self {
            store,
            server,
            notifiers,
            enrichment,
            options,
            db_created_at,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn server(&self) -> &Arc<dyn MediaServer> {
        &self.server
    }

    /// Entry point for the webhook path: resolves the payload to a full
    /// item (the push body has no stream data) and reconciles it.
    pub async fn handle_webhook(&self, payload: &WebhookPayload) -> anyhow::Result<Outcome> {
        let Some(kind) = payload.kind() else {
            return Ok(Outcome::Skipped("unsupported item type"));
        };
        let Some(item_id) = payload.item_id.as_deref() else {
            return Ok(Outcome::Skipped("payload without item id"));
        };

        // Prefer the server's full view; fall back to the payload's partial
        // fields when the fetch fails. The partial item fingerprints as
        // non-substantial, which is exactly the degraded behavior we want.
        let item = match self.server.get_item(item_id).await {
            Ok(Some(mut item)) => {
                if item.kind.is_none() {
                    item.kind = Some(kind);
                }
                item.provider_ids.merge(&payload.provider_ids());
                item
            }
            Ok(None) => item_from_payload(kind, payload),
            Err(e) => {
                warn!(item_id, error = %e, "Item fetch failed, using webhook fields only");
                item_from_payload(kind, payload)
            }
        };

        self.handle_candidate(&item, Origin::Webhook).await
    }

    /// The decision procedure. Failures are scoped to this one candidate;
    /// callers log and move on.
    pub async fn handle_candidate(
        &self,
        item: &MediaItem,
        origin: Origin,
    ) -> anyhow::Result<Outcome> {
        let outcome = match item.kind {
            Some(kind) if kind.has_ledger() => {
                let spec = kind_spec(kind).expect("ledger kinds always have a spec");
                self.reconcile_ledger_kind(spec, item, origin).await?
            }
            Some(ContentKind::Season) => self.reconcile_season(item, origin).await?,
            Some(ContentKind::Episode) => self.reconcile_episode(item, origin).await?,
            Some(ContentKind::Series) => Outcome::Skipped("series surface via their seasons"),
            _ => Outcome::Skipped("unsupported item type"),
        };

        match outcome {
            Outcome::New | Outcome::QualityUpdate | Outcome::SeasonProgress { .. } => {
                info!(
                    item_id = %item.id,
                    kind = item.kind.map(|k| k.wire_name()).unwrap_or("?"),
                    name = %item.name,
                    origin = ?origin,
                    outcome = ?outcome,
                    "Announced"
                );
            }
            // Steady-state outcomes would flood the log on every poll cycle
            _ => {
                debug!(
                    item_id = %item.id,
                    kind = item.kind.map(|k| k.wire_name()).unwrap_or("?"),
                    origin = ?origin,
                    outcome = ?outcome,
                    "Reconciled candidate"
                );
            }
        }
        Ok(outcome)
    }

    /// Movie path (representative for album/book/music video).
    async fn reconcile_ledger_kind(
        &self,
        spec: &'static dyn KindSpec,
        item: &MediaItem,
        origin: Origin,
    ) -> anyhow::Result<Outcome> {
        let kind = spec.kind();
        let Some(key) = spec.resolve_key(item) else {
            bail!(
                "cannot derive logical key for {} item {} (no ids, no name)",
                kind,
                item.id
            );
        };
        let now = Utc::now();

        // A poller-announced quality upgrade and the webhook for the same
        // ingest race each other; the webhook defers inside the window.
        if origin == Origin::Webhook
            && self
                .store
                .is_recent_quality_update(&key, self.options.suppression_window, now)
                .await?
        {
            return Ok(Outcome::Suppressed);
        }

        let snapshot = spec.fingerprint(item);
        let stored = self
            .store
            .store_snapshot(&item.id, &key, &snapshot, now)
            .await?;

        if stored.changed {
            let old = stored
                .old_snapshot
                .as_ref()
                .expect("changed implies an old snapshot");
            let message = spec.render_update(item, old, &stored.new_snapshot);
            self.deliver_all(Some(&item.id), None, &message).await;
            self.store.touch_quality_update(&key, &item.id, now).await?;
            return Ok(Outcome::QualityUpdate);
        }

        if self.store.announced(kind, &key).await?.is_some() {
            return Ok(Outcome::AlreadyAnnounced);
        }

        if self.is_pre_ledger(item) {
            // Existing library content on first deployment: record, stay quiet
            self.mark(kind, &key, item, now).await?;
            return Ok(Outcome::Baseline);
        }

        let extras = self.enrichment.extras_for_item(kind, item).await;
        let message = spec.render_new(item, &stored.new_snapshot, &extras);
        self.deliver_all(Some(&item.id), None, &message).await;
        self.mark(kind, &key, item, now).await?;
        Ok(Outcome::New)
    }

    /// Season path: progress tracker instead of the announcement ledger, so
    /// a season filling up episode-by-episode produces one consolidated
    /// notification per net increase.
    async fn reconcile_season(&self, item: &MediaItem, _origin: Origin) -> anyhow::Result<Outcome> {
        let season_id = item.id.as_str();
        let now = Utc::now();
        let series_name = item
            .series_name
            .clone()
            .unwrap_or_else(|| item.display_title());

        let counts = resilient_episode_counts(
            self.server.as_ref(),
            season_id,
            self.options.episode_count_attempts,
            self.options.episode_count_backoff,
        )
        .await
        .with_context(|| format!("episode counts for season {}", season_id))?;

        let existing = self.store.season_progress(season_id).await?;
        let baseline = existing.is_none()
            && (self.is_pre_ledger(item) || !self.options.season_announce_on_first_sight);
        if baseline {
            self.upsert_progress(item, &series_name, counts.present, counts.total, true, now)
                .await?;
            return Ok(Outcome::Baseline);
        }

        let should_notify = self
            .store
            .should_notify_season(
                season_id,
                counts.present,
                self.options.season_announce_on_first_sight,
            )
            .await?;
        if !should_notify {
            self.upsert_progress(item, &series_name, counts.present, counts.total, false, now)
                .await?;
            return Ok(Outcome::AlreadyAnnounced);
        }

        let overview = match &item.overview {
            Some(overview) => Some(overview.clone()),
            // A season without its own overview borrows the series one
            None => self.series_overview(item.series_id.as_deref()).await,
        };
        let extras = self
            .enrichment
            .extras_for_season(&series_name, item.year, item.provider_ids.tmdb.as_deref())
            .await;
        let message = render::render_season_progress(
            &series_name,
            item.year,
            item.season_number,
            counts.present,
            counts.total,
            overview.as_deref(),
            &extras,
        );
        self.deliver_all(Some(season_id), item.series_id.as_deref(), &message)
            .await;
        self.upsert_progress(item, &series_name, counts.present, counts.total, true, now)
            .await?;
        Ok(Outcome::SeasonProgress {
            present: counts.present,
            total: counts.total,
        })
    }

    /// Episode webhook path: gate on recency, then fold into the season's
    /// consolidated progress notification instead of announcing per part.
    async fn reconcile_episode(&self, item: &MediaItem, origin: Origin) -> anyhow::Result<Outcome> {
        let now = Utc::now();
        let Some(season_id) = item.season_id.as_deref() else {
            return Ok(Outcome::Skipped("episode without season linkage"));
        };

        let premiered_recently = item
            .premiere_date
            .map(|p| now - p < self.options.episode_premiered_within)
            .unwrap_or(false);
        if !premiered_recently {
            // Old content filling in; the series poller picks up the season
            // on its own cadence
            return Ok(Outcome::Skipped("premiered outside the recency window"));
        }

        let season = match self.server.get_item(season_id).await {
            Ok(Some(season)) => season,
            Ok(None) => return Ok(Outcome::Skipped("season not found")),
            Err(e) => {
                warn!(season_id, error = %e, "Season fetch failed");
                return Ok(Outcome::Skipped("season fetch failed"));
            }
        };

        if let Some(created) = season.date_created {
            if now - created < self.options.season_added_within {
                // The season itself just arrived; its own notification covers
                // this episode
                return Ok(Outcome::Skipped("season recently added"));
            }
        }

        self.reconcile_season(&season, origin).await
    }

    /// Aggregate quality check for a season's available episodes, fed by the
    /// episode-quality poller. Notifies once per season when files were
    /// replaced, never per episode.
    pub async fn check_season_quality(
        &self,
        season: &MediaItem,
        episodes: &[MediaItem],
    ) -> anyhow::Result<Outcome> {
        let now = Utc::now();
        let mut parts: Vec<(i32, String)> = Vec::new();

        for episode in episodes {
            let snapshot = crate::fingerprint::fingerprint(episode);
            if !snapshot.is_substantial() {
                continue;
            }
            let episode_number = episode.episode_number.unwrap_or(-1);
            // Season-scoped key: stable across file replacement, unique
            // across series even for identically named episodes
            let key = LogicalKey::new(format!("episode:{}:e{}", season.id, episode_number));
            self.store
                .store_snapshot(&episode.id, &key, &snapshot, now)
                .await?;
            parts.push((episode_number, snapshot.signature().as_str().to_string()));
        }

        if parts.is_empty() {
            return Ok(Outcome::Skipped("no substantial episode snapshots"));
        }
        parts.sort();
        let aggregate = parts
            .iter()
            .map(|(n, sig)| format!("e{}={}", n, sig))
            .collect::<Vec<_>>()
            .join(";");
        let episode_count = parts.len() as i64;

        let previous = self.store.season_quality(&season.id).await?;
        self.store
            .upsert_season_quality(&season.id, &aggregate, episode_count, now)
            .await?;

        match previous {
            // Same episode set, different signatures: a re-encode/replace
            Some((old_sig, old_count)) if old_count == episode_count && old_sig != aggregate => {
                let series_name = season
                    .series_name
                    .clone()
                    .unwrap_or_else(|| season.display_title());
                let message = render::render_season_quality_update(
                    &series_name,
                    season.season_number,
                    episode_count,
                );
                self.deliver_all(Some(&season.id), season.series_id.as_deref(), &message)
                    .await;
                Ok(Outcome::QualityUpdate)
            }
            // Count changes are arrivals, which the progress path announces
            Some(_) => Ok(Outcome::AlreadyAnnounced),
            None => Ok(Outcome::Baseline),
        }
    }

    fn is_pre_ledger(&self, item: &MediaItem) -> bool {
        item.date_created
            .map(|created| created < self.db_created_at)
            .unwrap_or(false)
    }

    async fn series_overview(&self, series_id: Option<&str>) -> Option<String> {
        let series_id = series_id?;
        match self.server.get_item(series_id).await {
            Ok(Some(series)) => series.overview,
            Ok(None) => None,
            Err(e) => {
                warn!(series_id, error = %e, "Series overview fetch failed");
                None
            }
        }
    }

    async fn mark(
        &self,
        kind: ContentKind,
        key: &LogicalKey,
        item: &MediaItem,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.store
            .mark_announced(
                kind,
                key,
                Some(&item.id),
                Some(&item.display_title()),
                item.year,
                now,
            )
            .await?;
        Ok(())
    }

    async fn upsert_progress(
        &self,
        item: &MediaItem,
        series_name: &str,
        present: i64,
        total: i64,
        mark_notified: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.store
            .upsert_season_progress(
                &item.id,
                item.series_id.as_deref(),
                Some(series_name),
                item.season_number,
                item.year,
                present,
                total,
                mark_notified,
                now,
            )
            .await?;
        Ok(())
    }

    /// Attempt every transport; one failing must not stop the others.
    async fn deliver_all(
        &self,
        poster_item_id: Option<&str>,
        fallback_item_id: Option<&str>,
        message: &str,
    ) {
        for notifier in &self.notifiers {
            match notifier
                .deliver(poster_item_id, fallback_item_id, message)
                .await
            {
                Ok(outcome) => {
                    if !outcome.primary_image_used {
                        info!(
                            notifier = notifier.name(),
                            "Delivered without the primary poster"
                        );
                    }
                }
                Err(e) => {
                    warn!(notifier = notifier.name(), error = %e, "Delivery failed");
                }
            }
        }
    }
}

fn item_from_payload(kind: ContentKind, payload: &WebhookPayload) -> MediaItem {
    MediaItem {
        id: payload.item_id.clone().unwrap_or_default(),
        kind: Some(kind),
        name: payload.name.clone().unwrap_or_default(),
        year: payload.year,
        provider_ids: payload.provider_ids(),
        overview: payload.overview.clone(),
        series_id: payload.series_id.clone(),
        series_name: payload.series_name.clone(),
        season_id: payload.season_id.clone(),
        season_number: payload.season_number_parsed(),
        episode_number: payload.episode_number_parsed(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_models::{MediaSourceInfo, MediaStream, ProviderIds, StreamKind};
    use herald_sources::{DeliveryOutcome, EpisodeFilter, ItemPage, SourceError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockServer {
        items: Mutex<HashMap<String, MediaItem>>,
        counts: Mutex<HashMap<String, (u32, u32)>>, // season_id -> (present, missing)
    }

    impl MockServer {
        fn put_item(&self, item: MediaItem) {
            self.items.lock().unwrap().insert(item.id.clone(), item);
        }

        fn set_counts(&self, season_id: &str, present: u32, missing: u32) {
            self.counts
                .lock()
                .unwrap()
                .insert(season_id.to_string(), (present, missing));
        }
    }

    #[async_trait]
    impl MediaServer for MockServer {
        async fn get_item(&self, item_id: &str) -> Result<Option<MediaItem>, SourceError> {
            Ok(self.items.lock().unwrap().get(item_id).cloned())
        }

        async fn list_items(
            &self,
            _kind: ContentKind,
            _start_index: u32,
            _limit: u32,
        ) -> Result<ItemPage, SourceError> {
            Ok(ItemPage::default())
        }

        async fn count_episodes(
            &self,
            season_id: &str,
            filter: EpisodeFilter,
        ) -> Result<u32, SourceError> {
            let counts = self.counts.lock().unwrap();
            let (present, missing) = counts.get(season_id).copied().unwrap_or((0, 0));
            Ok(match filter {
                EpisodeFilter::Present => present,
                EpisodeFilter::Missing => missing,
            })
        }

        async fn list_episodes(&self, _season_id: &str) -> Result<Vec<MediaItem>, SourceError> {
            Ok(Vec::new())
        }

        async fn is_scanning(&self) -> Result<bool, SourceError> {
            Ok(false)
        }

        async fn primary_image(&self, _item_id: &str) -> Result<Option<Vec<u8>>, SourceError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MockNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl MockNotifier {
        fn delivered(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        fn name(&self) -> &str {
            "mock"
        }

        async fn deliver(
            &self,
            _poster_item_id: Option<&str>,
            _fallback_item_id: Option<&str>,
            message: &str,
        ) -> Result<DeliveryOutcome, SourceError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(DeliveryOutcome {
                delivered: true,
                primary_image_used: true,
            })
        }
    }

    async fn engine_with(
        options: EngineOptions,
    ) -> (Engine, Arc<MockServer>, Arc<MockNotifier>) {
        let store = Store::connect_in_memory().await.unwrap();
        let server = Arc::new(MockServer::default());
        let notifier = Arc::new(MockNotifier::default());
        let engine = Engine::new(
            store,
            server.clone(),
            vec![notifier.clone()],
            Enrichment::disabled(),
            options,
        )
        .await
        .unwrap();
        (engine, server, notifier)
    }

    fn stream(kind: StreamKind, codec: &str) -> MediaStream {
        MediaStream {
            kind,
            codec: Some(codec.to_string()),
            ..Default::default()
        }
    }

    fn movie_1080p(item_id: &str) -> MediaItem {
        let mut video = stream(StreamKind::Video, "h264");
        video.width = Some(1920);
        video.height = Some(1080);
        MediaItem {
            id: item_id.to_string(),
            kind: Some(ContentKind::Movie),
            name: "Foo".to_string(),
            year: Some(2020),
            provider_ids: ProviderIds {
                imdb: Some("tt1".to_string()),
                ..Default::default()
            },
            date_created: Some(Utc::now()),
            media_sources: vec![MediaSourceInfo {
                container: Some("mkv".to_string()),
                size: Some(4_000_000_000),
                streams: vec![video, stream(StreamKind::Audio, "aac")],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn movie_2160p_hdr(item_id: &str) -> MediaItem {
        let mut item = movie_1080p(item_id);
        let video = &mut item.media_sources[0].streams[0];
        video.codec = Some("hevc".to_string());
        video.width = Some(3840);
        video.height = Some(2160);
        video.video_range_type = Some("HDR10".to_string());
        item
    }

    #[tokio::test]
    async fn test_new_movie_announced_exactly_once() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let item = movie_1080p("item1");

        let outcome = engine.handle_candidate(&item, Origin::Webhook).await.unwrap();
        assert_eq!(outcome, Outcome::New);

        // Same substantial snapshot again: idempotent
        let outcome = engine.handle_candidate(&item, Origin::Webhook).await.unwrap();
        assert_eq!(outcome, Outcome::AlreadyAnnounced);

        let messages = notifier.delivered();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("New Movie Added"));

        let record = engine
            .store()
            .announced(ContentKind::Movie, &LogicalKey::new("movie:imdb:tt1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.item_id.as_deref(), Some("item1"));
    }

    #[tokio::test]
    async fn test_upgrade_then_webhook_retry_is_suppressed() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;

        // Webhook announces the movie new
        let original = movie_1080p("item1");
        assert_eq!(
            engine.handle_candidate(&original, Origin::Webhook).await.unwrap(),
            Outcome::New
        );

        // Poller later re-observes the same movie with a new internal id and
        // a better file
        let upgraded = movie_2160p_hdr("item2");
        assert_eq!(
            engine.handle_candidate(&upgraded, Origin::Poller).await.unwrap(),
            Outcome::QualityUpdate
        );

        // Webhook fired by the same ingest arrives within the window
        assert_eq!(
            engine.handle_candidate(&upgraded, Origin::Webhook).await.unwrap(),
            Outcome::Suppressed
        );

        let messages = notifier.delivered();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("New Movie Added"));
        assert!(messages[1].contains("Quality Updated"));
        assert!(messages[1].contains('→'));
        assert!(messages[1].contains("2160p"));
    }

    #[tokio::test]
    async fn test_poller_sees_upgrade_even_without_webhook() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        engine
            .handle_candidate(&movie_1080p("item1"), Origin::Poller)
            .await
            .unwrap();

        // Poller paths never consult the suppression window
        assert_eq!(
            engine
                .handle_candidate(&movie_2160p_hdr("item2"), Origin::Poller)
                .await
                .unwrap(),
            Outcome::QualityUpdate
        );
        assert_eq!(notifier.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_pre_ledger_cutoff_baselines_quietly() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let mut item = movie_1080p("item1");
        item.date_created = Some(Utc::now() - Duration::days(365));

        let outcome = engine.handle_candidate(&item, Origin::Poller).await.unwrap();
        assert_eq!(outcome, Outcome::Baseline);
        assert!(notifier.delivered().is_empty());

        // Marked as announced so it never surfaces as new later
        assert!(engine
            .store()
            .announced(ContentKind::Movie, &LogicalKey::new("movie:imdb:tt1"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_empty_snapshot_candidate_still_announces_without_quality() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let mut item = movie_1080p("item1");
        item.media_sources.clear();

        assert_eq!(
            engine.handle_candidate(&item, Origin::Webhook).await.unwrap(),
            Outcome::New
        );
        let messages = notifier.delivered();
        assert!(!messages[0].contains("Quality"));
    }

    fn season(season_id: &str) -> MediaItem {
        MediaItem {
            id: season_id.to_string(),
            kind: Some(ContentKind::Season),
            name: "Season 1".to_string(),
            year: Some(2020),
            series_id: Some("series1".to_string()),
            series_name: Some("Foo".to_string()),
            season_number: Some(1),
            date_created: Some(Utc::now()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_season_progress_scenario() {
        let options = EngineOptions {
            episode_count_attempts: 1,
            episode_count_backoff: std::time::Duration::from_millis(1),
            ..Default::default()
        };
        let (engine, server, notifier) = engine_with(options).await;
        let item = season("season1");

        // 0/10: first sight, recorded quietly
        server.set_counts("season1", 0, 10);
        assert_eq!(
            engine.handle_candidate(&item, Origin::Poller).await.unwrap(),
            Outcome::Baseline
        );

        // 3/10: net increase
        server.set_counts("season1", 3, 7);
        assert_eq!(
            engine.handle_candidate(&item, Origin::Poller).await.unwrap(),
            Outcome::SeasonProgress { present: 3, total: 10 }
        );

        // 3/10 again: silence
        server.set_counts("season1", 3, 7);
        assert_eq!(
            engine.handle_candidate(&item, Origin::Poller).await.unwrap(),
            Outcome::AlreadyAnnounced
        );

        // 7/10: next net increase
        server.set_counts("season1", 7, 3);
        assert_eq!(
            engine.handle_candidate(&item, Origin::Poller).await.unwrap(),
            Outcome::SeasonProgress { present: 7, total: 10 }
        );

        let messages = notifier.delivered();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("Added 3 of 10 episodes"));
        assert!(messages[1].contains("Added 7 of 10 episodes"));
    }

    #[tokio::test]
    async fn test_season_first_sight_policy_announces_midfill() {
        let options = EngineOptions {
            season_announce_on_first_sight: true,
            episode_count_attempts: 1,
            episode_count_backoff: std::time::Duration::from_millis(1),
            ..Default::default()
        };
        let (engine, server, notifier) = engine_with(options).await;
        server.set_counts("season1", 5, 5);

        assert_eq!(
            engine
                .handle_candidate(&season("season1"), Origin::Poller)
                .await
                .unwrap(),
            Outcome::SeasonProgress { present: 5, total: 10 }
        );
        assert!(notifier.delivered()[0].contains("Added 5 of 10 episodes"));
    }

    fn episode(season_id: &str, premiered_days_ago: i64) -> MediaItem {
        MediaItem {
            id: "ep1".to_string(),
            kind: Some(ContentKind::Episode),
            name: "Pilot".to_string(),
            season_id: Some(season_id.to_string()),
            series_name: Some("Foo".to_string()),
            premiere_date: Some(Utc::now() - Duration::days(premiered_days_ago)),
            date_created: Some(Utc::now()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_old_episode_is_skipped() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let outcome = engine
            .handle_candidate(&episode("season1", 300), Origin::Webhook)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped("premiered outside the recency window"));
        assert!(notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_recent_episode_folds_into_season_progress() {
        let options = EngineOptions {
            episode_count_attempts: 1,
            episode_count_backoff: std::time::Duration::from_millis(1),
            // Treat even a fresh season as eligible
            season_added_within: Duration::zero(),
            ..Default::default()
        };
        let (engine, server, notifier) = engine_with(options).await;

        let mut season_item = season("season1");
        // The season record predates the episode arrival
        season_item.date_created = Some(Utc::now() - Duration::days(30));
        server.put_item(season_item);

        // Seed progress so the arrival is a net increase, not first sight
        server.set_counts("season1", 2, 8);
        engine
            .handle_candidate(&season("season1"), Origin::Poller)
            .await
            .unwrap();

        server.set_counts("season1", 3, 7);
        let outcome = engine
            .handle_candidate(&episode("season1", 2), Origin::Webhook)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::SeasonProgress { present: 3, total: 10 });
        assert_eq!(notifier.delivered().len(), 1);
    }

    fn episode_with_quality(id: &str, number: i32, codec: &str) -> MediaItem {
        let mut video = stream(StreamKind::Video, codec);
        video.width = Some(1920);
        video.height = Some(1080);
        MediaItem {
            id: id.to_string(),
            kind: Some(ContentKind::Episode),
            name: format!("Episode {}", number),
            episode_number: Some(number),
            media_sources: vec![MediaSourceInfo {
                container: Some("mkv".to_string()),
                streams: vec![video],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_season_quality_aggregate_change() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let season_item = season("season1");

        let episodes_v1 = vec![
            episode_with_quality("e1", 1, "h264"),
            episode_with_quality("e2", 2, "h264"),
        ];
        assert_eq!(
            engine
                .check_season_quality(&season_item, &episodes_v1)
                .await
                .unwrap(),
            Outcome::Baseline
        );

        // Same files again: nothing to say
        assert_eq!(
            engine
                .check_season_quality(&season_item, &episodes_v1)
                .await
                .unwrap(),
            Outcome::AlreadyAnnounced
        );

        // Both episodes re-encoded: one consolidated notification
        let episodes_v2 = vec![
            episode_with_quality("e1b", 1, "hevc"),
            episode_with_quality("e2b", 2, "hevc"),
        ];
        assert_eq!(
            engine
                .check_season_quality(&season_item, &episodes_v2)
                .await
                .unwrap(),
            Outcome::QualityUpdate
        );

        // A third episode arriving is progress, not a quality event
        let mut episodes_v3 = episodes_v2.clone();
        episodes_v3.push(episode_with_quality("e3", 3, "hevc"));
        assert_eq!(
            engine
                .check_season_quality(&season_item, &episodes_v3)
                .await
                .unwrap(),
            Outcome::AlreadyAnnounced
        );

        let messages = notifier.delivered();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Season Quality Updated"));
    }

    #[tokio::test]
    async fn test_webhook_payload_with_unfetchable_item_degrades() {
        let (engine, _server, notifier) = engine_with(EngineOptions::default()).await;
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "ItemType": "Movie",
                "ItemId": "item1",
                "Name": "Foo",
                "Year": 2020,
                "Provider_imdb": "tt1"
            }"#,
        )
        .unwrap();

        // Item fetch returns None (mock server has no items): the partial
        // payload still announces, minus the quality block
        assert_eq!(engine.handle_webhook(&payload).await.unwrap(), Outcome::New);
        assert_eq!(notifier.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_candidate_without_identity_fails_in_isolation() {
        let (engine, _server, _notifier) = engine_with(EngineOptions::default()).await;
        let mut item = movie_1080p("item1");
        item.name = "  ".to_string();
        item.provider_ids = ProviderIds::default();
        item.year = None;
        assert!(engine.handle_candidate(&item, Origin::Poller).await.is_err());
    }
}
