use chrono::{DateTime, Utc};
use herald_models::{ContentKind, MediaItem, MediaSourceInfo, ProviderIds};
use serde::Deserialize;
use std::collections::HashMap;

/// Envelope the server wraps every item listing in.
#[derive(Debug, Deserialize)]
pub struct ItemsResponse {
    #[serde(rename = "Items", default)]
    pub items: Vec<ItemDto>,
    #[serde(rename = "TotalRecordCount", default)]
    pub total_record_count: u32,
}

/// Raw item as returned by `/Items`. Only consumed fields are modeled.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
pub struct ItemDto {
    pub id: String,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub name: Option<String>,
    pub production_year: Option<i32>,
    pub provider_ids: Option<HashMap<String, String>>,
    pub overview: Option<String>,
    pub run_time_ticks: Option<i64>,
    pub album_artist: Option<String>,

    pub series_id: Option<String>,
    pub series_name: Option<String>,
    pub season_id: Option<String>,
    pub parent_index_number: Option<i32>,
    pub index_number: Option<i32>,

    pub premiere_date: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,

    pub media_sources: Option<Vec<MediaSourceInfo>>,
}

impl ItemDto {
    /// Provider id keys arrive with inconsistent casing across server
    /// versions; match case-insensitively.
    fn provider(&self, key: &str) -> Option<String> {
        let map = self.provider_ids.as_ref()?;
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    }

    pub fn into_media_item(self) -> MediaItem {
        let provider_ids = ProviderIds {
            imdb: self.provider("Imdb"),
            tmdb: self.provider("Tmdb"),
            tvdb: self.provider("Tvdb"),
            musicbrainz_album: self.provider("MusicBrainzAlbum"),
            musicbrainz_artist: self.provider("MusicBrainzAlbumArtist"),
        };
        MediaItem {
            kind: self.item_type.as_deref().and_then(ContentKind::from_wire),
            id: self.id,
            name: self.name.unwrap_or_default(),
            year: self.production_year,
            provider_ids,
            overview: self.overview,
            run_time_ticks: self.run_time_ticks,
            artist: self.album_artist,
            series_id: self.series_id,
            series_name: self.series_name,
            season_id: self.season_id,
            season_number: self.parent_index_number,
            episode_number: self.index_number,
            premiere_date: self.premiere_date,
            date_created: self.date_created,
            media_sources: self.media_sources.unwrap_or_default(),
        }
    }
}

/// Entry from `/ScheduledTasks`, used for the advisory scan-idle gate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduledTaskDto {
    pub key: Option<String>,
    pub state: Option<String>,
}

impl ScheduledTaskDto {
    pub fn is_running_library_scan(&self) -> bool {
        self.key.as_deref() == Some("RefreshLibrary")
            && self.state.as_deref() == Some("Running")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_models::StreamKind;

    #[test]
    fn test_item_dto_maps_to_media_item() {
        let json = r#"{
            "Id": "item1",
            "Type": "Movie",
            "Name": "Foo",
            "ProductionYear": 2020,
            "ProviderIds": {"Imdb": "tt1", "Tmdb": "42"},
            "RunTimeTicks": 72000000000,
            "DateCreated": "2024-05-01T12:00:00.0000000Z",
            "MediaSources": [{
                "Container": "mkv",
                "Size": 4000000000,
                "MediaStreams": [
                    {"Type": "Video", "Codec": "h264", "Width": 1920, "Height": 1080},
                    {"Type": "Audio", "Codec": "aac", "Channels": 2}
                ]
            }]
        }"#;
        let dto: ItemDto = serde_json::from_str(json).unwrap();
        let item = dto.into_media_item();
        assert_eq!(item.kind, Some(ContentKind::Movie));
        assert_eq!(item.provider_ids.imdb.as_deref(), Some("tt1"));
        assert_eq!(item.runtime_minutes(), Some(120));
        let source = item.first_source().unwrap();
        assert_eq!(source.container.as_deref(), Some("mkv"));
        assert_eq!(
            source.first_stream(StreamKind::Video).unwrap().codec.as_deref(),
            Some("h264")
        );
    }

    #[test]
    fn test_provider_lookup_is_case_insensitive() {
        let json = r#"{"Id": "x", "ProviderIds": {"IMDB": "tt9", "tmdb": ""}}"#;
        let dto: ItemDto = serde_json::from_str(json).unwrap();
        let item = dto.into_media_item();
        assert_eq!(item.provider_ids.imdb.as_deref(), Some("tt9"));
        // Empty values are treated as absent
        assert!(item.provider_ids.tmdb.is_none());
    }

    #[test]
    fn test_scheduled_task_scan_detection() {
        let running: ScheduledTaskDto =
            serde_json::from_str(r#"{"Key": "RefreshLibrary", "State": "Running"}"#).unwrap();
        assert!(running.is_running_library_scan());
        let idle: ScheduledTaskDto =
            serde_json::from_str(r#"{"Key": "RefreshLibrary", "State": "Idle"}"#).unwrap();
        assert!(!idle.is_running_library_scan());
    }
}
