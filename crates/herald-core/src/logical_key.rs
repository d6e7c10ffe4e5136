//! Logical key resolution.
//!
//! Maps a transient item to the stable identity the ledger keys on. External
//! catalog ids win over everything; the normalized title+year form is the
//! fallback for content the server has not matched yet. If an external id
//! shows up on a later observation the key changes, which yields one
//! harmless duplicate "new" entry rather than data corruption; the stale
//! row ages out through garbage collection.

use herald_models::{ContentKind, LogicalKey, MediaItem, ProviderIds};

/// Resolve the logical key for a candidate. `None` only when the item has
/// neither any external id nor a usable name, which is an invariant
/// violation isolated to that single candidate.
pub fn resolve_key(item: &MediaItem) -> Option<LogicalKey> {
    let kind = item.kind?;
    resolve_key_parts(kind, &item.provider_ids, &item.display_title(), item.year)
}

pub fn resolve_key_parts(
    kind: ContentKind,
    ids: &ProviderIds,
    name: &str,
    year: Option<i32>,
) -> Option<LogicalKey> {
    let slug = kind.slug();

    fn nonblank(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    // Fixed priority per kind: primary external catalog id, then secondary,
    // then normalized title+year
    let external = match kind {
        ContentKind::Album => nonblank(&ids.musicbrainz_album)
            .map(|id| ("mbid", id))
            .or(nonblank(&ids.tmdb).map(|id| ("tmdb", id))),
        _ => nonblank(&ids.imdb)
            .map(|id| ("imdb", id))
            .or(nonblank(&ids.tmdb).map(|id| ("tmdb", id)))
            .or(nonblank(&ids.tvdb).map(|id| ("tvdb", id))),
    };

    if let Some((source, value)) = external {
        return Some(LogicalKey::new(format!("{slug}:{source}:{value}")));
    }

    let normalized = normalize_title(name);
    if normalized.is_empty() {
        return None;
    }
    let key = match year {
        Some(year) => format!("{slug}:title:{normalized} ({year})"),
        None => format!("{slug}:title:{normalized}"),
    };
    Some(LogicalKey::new(key))
}

/// Casefold and collapse whitespace so cosmetic renames do not change
/// identity.
fn normalize_title(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
