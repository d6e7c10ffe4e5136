use async_trait::async_trait;
use herald_models::{ContentKind, MediaItem};

use crate::error::SourceError;

/// One page of a catalog listing.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<MediaItem>,
    pub total: u32,
}

/// Which episodes to count within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeFilter {
    /// Episodes with an on-disk file.
    Present,
    /// Episodes the server expects but has no file for yet.
    Missing,
}

/// The media server's metadata surface, as consumed by the reconciliation
/// engine and the pollers.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Fetch a single item with full technical fields. `None` when the id is
    /// unknown (e.g. deleted between observation and fetch).
    async fn get_item(&self, item_id: &str) -> Result<Option<MediaItem>, SourceError>;

    /// One page of the catalog for a kind, newest first.
    async fn list_items(
        &self,
        kind: ContentKind,
        start_index: u32,
        limit: u32,
    ) -> Result<ItemPage, SourceError>;

    async fn count_episodes(
        &self,
        season_id: &str,
        filter: EpisodeFilter,
    ) -> Result<u32, SourceError>;

    /// All episodes of a season with full technical fields.
    async fn list_episodes(&self, season_id: &str) -> Result<Vec<MediaItem>, SourceError>;

    /// Whether a library scan is currently running. Advisory only.
    async fn is_scanning(&self) -> Result<bool, SourceError>;

    /// Raw bytes of the item's primary image, `None` when it has none.
    async fn primary_image(&self, item_id: &str) -> Result<Option<Vec<u8>>, SourceError>;
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryOutcome {
    pub delivered: bool,
    /// False when the transport had to fall back past the primary poster
    /// (fallback image or text-only).
    pub primary_image_used: bool,
}

/// A notification transport. The engine renders the message; the transport
/// only attaches imagery and ships it.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a rendered Markdown message. `poster_item_id` names the item
    /// whose primary image should lead the message; `fallback_item_id` is
    /// tried when that image is unavailable (e.g. a season falling back to
    /// its series poster).
    async fn deliver(
        &self,
        poster_item_id: Option<&str>,
        fallback_item_id: Option<&str>,
        message: &str,
    ) -> Result<DeliveryOutcome, SourceError>;
}
