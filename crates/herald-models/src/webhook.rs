use serde::{Deserialize, Serialize};

use crate::{ContentKind, ProviderIds};

/// Inbound webhook body fired by the media server on item ingest.
///
/// Only the fields herald consumes are modeled; unknown fields are ignored.
/// Field names are the server's flattened template variables, including the
/// zero-padded season/episode numbers it sends as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    #[serde(rename = "ItemType")]
    pub item_type: Option<String>,
    #[serde(rename = "ItemId")]
    pub item_id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Overview")]
    pub overview: Option<String>,
    #[serde(rename = "RunTime")]
    pub run_time: Option<String>,

    #[serde(rename = "SeriesId")]
    pub series_id: Option<String>,
    #[serde(rename = "SeriesName")]
    pub series_name: Option<String>,
    #[serde(rename = "SeasonId")]
    pub season_id: Option<String>,
    #[serde(rename = "SeasonNumber00")]
    pub season_number: Option<String>,
    #[serde(rename = "EpisodeNumber00")]
    pub episode_number: Option<String>,

    #[serde(rename = "Provider_imdb")]
    pub provider_imdb: Option<String>,
    #[serde(rename = "Provider_tmdb")]
    pub provider_tmdb: Option<String>,
    #[serde(rename = "Provider_tvdb")]
    pub provider_tvdb: Option<String>,
    #[serde(rename = "Provider_musicbrainzalbum")]
    pub provider_musicbrainz_album: Option<String>,
}

impl WebhookPayload {
    pub fn kind(&self) -> Option<ContentKind> {
        self.item_type.as_deref().and_then(ContentKind::from_wire)
    }

    pub fn provider_ids(&self) -> ProviderIds {
        ProviderIds {
            imdb: self.provider_imdb.clone(),
            tmdb: self.provider_tmdb.clone(),
            tvdb: self.provider_tvdb.clone(),
            musicbrainz_album: self.provider_musicbrainz_album.clone(),
            musicbrainz_artist: None,
        }
    }

    /// Zero-padded "03"-style numbers arrive as strings; parse leniently.
    pub fn season_number_parsed(&self) -> Option<i32> {
        self.season_number.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn episode_number_parsed(&self) -> Option<i32> {
        self.episode_number.as_deref().and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_server_payload() {
        let json = r#"{
            "ItemType": "Episode",
            "ItemId": "abc123",
            "Name": "Pilot",
            "Year": 2020,
            "SeriesName": "Foo",
            "SeasonNumber00": "01",
            "EpisodeNumber00": "07",
            "Provider_tmdb": "42",
            "Unknown_Field": true
        }"#;
        let payload: WebhookPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.kind(), Some(ContentKind::Episode));
        assert_eq!(payload.item_id.as_deref(), Some("abc123"));
        assert_eq!(payload.season_number_parsed(), Some(1));
        assert_eq!(payload.episode_number_parsed(), Some(7));
        assert_eq!(payload.provider_ids().tmdb.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.kind().is_none());
        assert!(payload.season_number_parsed().is_none());
        assert!(payload.provider_ids().is_empty());
    }
}
