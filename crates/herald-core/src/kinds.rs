//! Per-kind reconciliation dispatch.
//!
//! Each announceable kind implements the same small interface, and the
//! engine looks the implementation up by [`ContentKind`]. This replaces the
//! long per-kind `if` chains that would otherwise repeat across the webhook
//! path and every poller.

use herald_models::{ContentKind, LogicalKey, MediaItem, QualitySnapshot};

use crate::enrichment::RenderExtras;
use crate::fingerprint::fingerprint;
use crate::logical_key::resolve_key_parts;
use crate::render;

pub trait KindSpec: Send + Sync {
    fn kind(&self) -> ContentKind;

    fn resolve_key(&self, item: &MediaItem) -> Option<LogicalKey> {
        resolve_key_parts(
            self.kind(),
            &item.provider_ids,
            &item.display_title(),
            item.year,
        )
    }

    fn fingerprint(&self, item: &MediaItem) -> QualitySnapshot {
        fingerprint(item)
    }

    fn render_new(
        &self,
        item: &MediaItem,
        snapshot: &QualitySnapshot,
        extras: &RenderExtras,
    ) -> String;

    fn render_update(
        &self,
        item: &MediaItem,
        old: &QualitySnapshot,
        new: &QualitySnapshot,
    ) -> String {
        render::render_quality_update(item, old, new)
    }
}

struct MovieKind;

impl KindSpec for MovieKind {
    fn kind(&self) -> ContentKind {
        ContentKind::Movie
    }

    fn render_new(
        &self,
        item: &MediaItem,
        snapshot: &QualitySnapshot,
        extras: &RenderExtras,
    ) -> String {
        render::render_new_movie(item, snapshot, extras)
    }
}

struct AlbumKind;

impl KindSpec for AlbumKind {
    fn kind(&self) -> ContentKind {
        ContentKind::Album
    }

    fn render_new(
        &self,
        item: &MediaItem,
        _snapshot: &QualitySnapshot,
        extras: &RenderExtras,
    ) -> String {
        render::render_new_album(item, extras)
    }
}

struct BookKind;

impl KindSpec for BookKind {
    fn kind(&self) -> ContentKind {
        ContentKind::Book
    }

    fn render_new(
        &self,
        item: &MediaItem,
        _snapshot: &QualitySnapshot,
        extras: &RenderExtras,
    ) -> String {
        render::render_new_book(item, extras)
    }
}

struct MusicVideoKind;

impl KindSpec for MusicVideoKind {
    fn kind(&self) -> ContentKind {
        ContentKind::MusicVideo
    }

    fn render_new(
        &self,
        item: &MediaItem,
        snapshot: &QualitySnapshot,
        extras: &RenderExtras,
    ) -> String {
        render::render_new_music_video(item, snapshot, extras)
    }
}

static MOVIE: MovieKind = MovieKind;
static ALBUM: AlbumKind = AlbumKind;
static BOOK: BookKind = BookKind;
static MUSIC_VIDEO: MusicVideoKind = MusicVideoKind;

/// Lookup table for the kinds that go through the announcement ledger.
/// Seasons and episodes take the progress-tracker path instead.
pub fn kind_spec(kind: ContentKind) -> Option<&'static dyn KindSpec> {
    match kind {
        ContentKind::Movie => Some(&MOVIE),
        ContentKind::Album => Some(&ALBUM),
        ContentKind::Book => Some(&BOOK),
        ContentKind::MusicVideo => Some(&MUSIC_VIDEO),
        _ => None,
    }
}
