use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of content kinds herald reconciles.
///
/// Wire names match the media server's `Type`/`ItemType` strings
/// (`MusicAlbum` for albums, everything else verbatim).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Movie,
    Series,
    Season,
    Episode,
    Album,
    Book,
    MusicVideo,
}

impl ContentKind {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Movie" => Some(Self::Movie),
            "Series" => Some(Self::Series),
            "Season" => Some(Self::Season),
            "Episode" => Some(Self::Episode),
            "MusicAlbum" => Some(Self::Album),
            "Book" => Some(Self::Book),
            "MusicVideo" => Some(Self::MusicVideo),
            _ => None,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
            Self::Season => "Season",
            Self::Episode => "Episode",
            Self::Album => "MusicAlbum",
            Self::Book => "Book",
            Self::MusicVideo => "MusicVideo",
        }
    }

    /// Short lowercase slug used as the logical-key prefix.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Season => "season",
            Self::Episode => "episode",
            Self::Album => "album",
            Self::Book => "book",
            Self::MusicVideo => "mvid",
        }
    }

    /// Kinds that carry their own announcement ledger table.
    /// Seasons and episodes go through the progress tracker instead,
    /// and series are announced via their first season.
    pub fn has_ledger(&self) -> bool {
        matches!(
            self,
            Self::Movie | Self::Album | Self::Book | Self::MusicVideo
        )
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// External catalog identifiers attached to an item.
///
/// Internal item ids churn when files are replaced; these do not, which is
/// why logical keys prefer them. Only filled-in fields are meaningful.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderIds {
    pub imdb: Option<String>,
    pub tmdb: Option<String>,
    pub tvdb: Option<String>,
    pub musicbrainz_album: Option<String>,
    pub musicbrainz_artist: Option<String>,
}

impl ProviderIds {
    pub fn is_empty(&self) -> bool {
        self.imdb.is_none()
            && self.tmdb.is_none()
            && self.tvdb.is_none()
            && self.musicbrainz_album.is_none()
            && self.musicbrainz_artist.is_none()
    }

    /// Merge ids from another observation, only filling in None values.
    /// Existing values are never overwritten.
    pub fn merge(&mut self, other: &ProviderIds) {
        if self.imdb.is_none() {
            self.imdb = other.imdb.clone();
        }
        if self.tmdb.is_none() {
            self.tmdb = other.tmdb.clone();
        }
        if self.tvdb.is_none() {
            self.tvdb = other.tvdb.clone();
        }
        if self.musicbrainz_album.is_none() {
            self.musicbrainz_album = other.musicbrainz_album.clone();
        }
        if self.musicbrainz_artist.is_none() {
            self.musicbrainz_artist = other.musicbrainz_artist.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl Default for StreamKind {
    fn default() -> Self {
        Self::Other
    }
}

/// One technical stream inside a media source, as reported by the server.
/// Field names follow the server's `MediaStream` JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MediaStream {
    #[serde(rename = "Type", deserialize_with = "stream_kind_from_wire")]
    pub kind: StreamKind,
    pub codec: Option<String>,
    pub profile: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub bit_rate: Option<i64>,
    pub bit_depth: Option<i64>,
    pub average_frame_rate: Option<f64>,
    pub channels: Option<i64>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
    pub video_range: Option<String>,
    pub video_range_type: Option<String>,
    pub dv_profile: Option<i64>,
}

fn stream_kind_from_wire<'de, D>(deserializer: D) -> Result<StreamKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("Video") => StreamKind::Video,
        Some("Audio") => StreamKind::Audio,
        Some("Subtitle") => StreamKind::Subtitle,
        _ => StreamKind::Other,
    })
}

/// One physical file backing an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct MediaSourceInfo {
    pub container: Option<String>,
    pub size: Option<i64>,
    pub bitrate: Option<i64>,
    pub run_time_ticks: Option<i64>,
    #[serde(rename = "MediaStreams")]
    pub streams: Vec<MediaStream>,
}

impl MediaSourceInfo {
    pub fn first_stream(&self, kind: StreamKind) -> Option<&MediaStream> {
        self.streams.iter().find(|s| s.kind == kind)
    }
}

/// A media item as observed from either the webhook or a poller page.
///
/// Ephemeral: the internal `id` can change when a file is replaced, which is
/// exactly why reconciliation keys on [`crate::LogicalKey`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub kind: Option<ContentKind>,
    pub name: String,
    pub year: Option<i32>,
    pub provider_ids: ProviderIds,
    pub overview: Option<String>,
    pub run_time_ticks: Option<i64>,
    pub artist: Option<String>,

    // Series/season linkage (seasons and episodes only)
    pub series_id: Option<String>,
    pub series_name: Option<String>,
    pub season_id: Option<String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,

    pub premiere_date: Option<DateTime<Utc>>,
    pub date_created: Option<DateTime<Utc>>,

    pub media_sources: Vec<MediaSourceInfo>,
}

impl MediaItem {
    /// Display title with a trailing " (year)" suffix stripped, since some
    /// libraries bake the year into the item name.
    pub fn display_title(&self) -> String {
        match self.year {
            Some(year) => self
                .name
                .trim_end_matches(&format!(" ({year})"))
                .trim()
                .to_string(),
            None => self.name.trim().to_string(),
        }
    }

    pub fn first_source(&self) -> Option<&MediaSourceInfo> {
        self.media_sources.first()
    }

    /// Runtime in whole minutes, if the server reported ticks (100ns units).
    pub fn runtime_minutes(&self) -> Option<i64> {
        self.run_time_ticks.map(|t| t / 600_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_wire_round_trip() {
        for kind in [
            ContentKind::Movie,
            ContentKind::Series,
            ContentKind::Season,
            ContentKind::Episode,
            ContentKind::Album,
            ContentKind::Book,
            ContentKind::MusicVideo,
        ] {
            assert_eq!(ContentKind::from_wire(kind.wire_name()), Some(kind));
        }
        assert_eq!(ContentKind::from_wire("Photo"), None);
    }

    #[test]
    fn test_provider_ids_merge_keeps_existing() {
        let mut ids = ProviderIds {
            imdb: Some("tt1".to_string()),
            ..Default::default()
        };
        let other = ProviderIds {
            imdb: Some("tt2".to_string()),
            tmdb: Some("42".to_string()),
            ..Default::default()
        };
        ids.merge(&other);
        assert_eq!(ids.imdb.as_deref(), Some("tt1"));
        assert_eq!(ids.tmdb.as_deref(), Some("42"));
    }

    #[test]
    fn test_display_title_strips_year_suffix() {
        let item = MediaItem {
            name: "Foo (2020)".to_string(),
            year: Some(2020),
            ..Default::default()
        };
        assert_eq!(item.display_title(), "Foo");

        let item = MediaItem {
            name: "Foo".to_string(),
            year: Some(2020),
            ..Default::default()
        };
        assert_eq!(item.display_title(), "Foo");
    }

    #[test]
    fn test_media_stream_deserializes_server_json() {
        let json = r#"{
            "Type": "Video",
            "Codec": "hevc",
            "Width": 3840,
            "Height": 2160,
            "BitRate": 25000000,
            "BitDepth": 10,
            "VideoRangeType": "HDR10"
        }"#;
        let stream: MediaStream = serde_json::from_str(json).unwrap();
        assert_eq!(stream.kind, StreamKind::Video);
        assert_eq!(stream.codec.as_deref(), Some("hevc"));
        assert_eq!(stream.width, Some(3840));
        assert_eq!(stream.video_range_type.as_deref(), Some("HDR10"));
    }
}
