//! Optional enrichment gathering.
//!
//! Wraps the third-party lookup clients and produces the pre-fetched extras
//! the renderers fold in. Every lookup is best-effort; missing keys or
//! failed calls produce `None` fields and the message ships without them.

use herald_config::EnrichmentConfig;
use herald_models::{ContentKind, MediaItem};
use herald_sources::{MdblistClient, TmdbClient, YoutubeClient};

/// Pre-fetched optional message sections.
#[derive(Debug, Clone, Default)]
pub struct RenderExtras {
    pub ratings: Option<String>,
    pub trailer_url: Option<String>,
}

impl RenderExtras {
    pub fn none() -> Self {
        Self::default()
    }
}

pub struct Enrichment {
    mdblist: Option<MdblistClient>,
    youtube: Option<YoutubeClient>,
    tmdb: Option<TmdbClient>,
}

impl Enrichment {
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            mdblist: config.mdblist_api_key.as_deref().map(MdblistClient::new),
            youtube: config.youtube_api_key.as_deref().map(YoutubeClient::new),
            tmdb: config.tmdb_api_key.as_deref().map(TmdbClient::new),
        }
    }

    pub fn disabled() -> Self {
        Self {
            mdblist: None,
            youtube: None,
            tmdb: None,
        }
    }

    /// Gather extras for a movie-like item.
    pub async fn extras_for_item(&self, kind: ContentKind, item: &MediaItem) -> RenderExtras {
        let mdblist_type = match kind {
            ContentKind::Movie => Some("movie"),
            ContentKind::Series | ContentKind::Season | ContentKind::Episode => Some("show"),
            _ => None,
        };

        let ratings = match (&self.mdblist, mdblist_type, item.provider_ids.tmdb.as_deref()) {
            (Some(client), Some(mdblist_type), Some(tmdb_id)) => {
                client.ratings(mdblist_type, tmdb_id).await
            }
            _ => None,
        };

        let trailer_url = match (&self.youtube, kind) {
            (Some(client), ContentKind::Movie) => {
                client.trailer_url(&item.display_title(), item.year).await
            }
            _ => None,
        };

        RenderExtras {
            ratings,
            trailer_url,
        }
    }

    /// Gather extras for a season, resolving the series TMDB id via search
    /// when the observation did not carry one (seasons rarely do).
    pub async fn extras_for_season(
        &self,
        series_name: &str,
        year: Option<i32>,
        series_tmdb_id: Option<&str>,
    ) -> RenderExtras {
        let tmdb_id = match series_tmdb_id {
            Some(id) => Some(id.to_string()),
            None => match &self.tmdb {
                Some(client) => client.find_tv_id(series_name, year).await,
                None => None,
            },
        };

        let ratings = match (&self.mdblist, tmdb_id.as_deref()) {
            (Some(client), Some(tmdb_id)) => client.ratings("show", tmdb_id).await,
            _ => None,
        };

        let trailer_url = match &self.youtube {
            Some(client) => client.trailer_url(series_name, year).await,
            None => None,
        };

        RenderExtras {
            ratings,
            trailer_url,
        }
    }
}
