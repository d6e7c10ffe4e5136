use serde::{Deserialize, Serialize};

/// Dynamic-range / image profile of a video stream.
///
/// Ordering is by richness: `DolbyVision > Hdr10Plus > Hdr10 > Hlg > Hdr > Sdr`.
/// A stream can advertise several profiles at once (e.g. Dolby Vision with an
/// HDR10 fallback layer); the snapshot keeps them ordered best-first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DynamicRange {
    Sdr,
    Hdr,
    Hlg,
    Hdr10,
    Hdr10Plus,
    DolbyVision,
}

impl DynamicRange {
    pub fn label(&self) -> &'static str {
        match self {
            Self::DolbyVision => "Dolby Vision",
            Self::Hdr10Plus => "HDR10+",
            Self::Hdr10 => "HDR10",
            Self::Hlg => "HLG",
            Self::Hdr => "HDR",
            Self::Sdr => "SDR",
        }
    }

    /// Short token used inside signatures.
    pub fn token(&self) -> &'static str {
        match self {
            Self::DolbyVision => "dv",
            Self::Hdr10Plus => "hdr10plus",
            Self::Hdr10 => "hdr10",
            Self::Hlg => "hlg",
            Self::Hdr => "hdr",
            Self::Sdr => "sdr",
        }
    }
}

/// Derived technical attributes of one observed file.
///
/// A snapshot with nothing populated is what the server hands out while it is
/// still parsing a freshly added file; [`QualitySnapshot::is_substantial`]
/// guards every change decision against mistaking that for a real downgrade.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QualitySnapshot {
    pub video_codec: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub video_bitrate: Option<i64>,
    /// Ordered best-first, deduplicated. SDR is the fallback whenever a video
    /// stream exists at all; empty means no video stream was seen.
    pub dynamic_range: Vec<DynamicRange>,
    pub bit_depth: Option<i64>,
    pub frame_rate: Option<f64>,
    pub audio_codec: Option<String>,
    pub audio_channels: Option<i64>,
    pub audio_bitrate: Option<i64>,
    pub container: Option<String>,
    pub size_bytes: Option<i64>,
    pub run_time_ticks: Option<i64>,
}

impl QualitySnapshot {
    /// A snapshot is substantial when at least one identity-bearing technical
    /// field is populated. Non-substantial snapshots never count as changes
    /// and are never inserted as a logical key's first quality row.
    pub fn is_substantial(&self) -> bool {
        self.video_codec.is_some()
            || (self.width.is_some() && self.height.is_some())
            || self.audio_codec.is_some()
            || self.container.is_some()
            || self.size_bytes.is_some()
    }

    /// Human label for the resolution, e.g. "2160p" / "1080p" / "1280x720".
    pub fn resolution_label(&self) -> Option<String> {
        let (w, h) = (self.width?, self.height?);
        let label = match (w, h) {
            _ if h >= 2000 || w >= 3800 => "2160p".to_string(),
            _ if h >= 1050 || w >= 1900 => "1080p".to_string(),
            _ if h >= 700 || w >= 1260 => "720p".to_string(),
            _ if h >= 570 => "576p".to_string(),
            _ if h >= 470 => "480p".to_string(),
            _ => format!("{}x{}", w, h),
        };
        Some(label)
    }

    /// Best (first) dynamic-range profile, if any.
    pub fn best_range(&self) -> Option<DynamicRange> {
        self.dynamic_range.first().copied()
    }

    /// One-line human summary, e.g. "2160p hevc HDR10 · eac3 5.1ch".
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(res) = self.resolution_label() {
            parts.push(res);
        }
        if let Some(ref codec) = self.video_codec {
            parts.push(codec.clone());
        }
        if let Some(range) = self.best_range() {
            parts.push(range.label().to_string());
        }
        let video = parts.join(" ");

        let mut audio_parts: Vec<String> = Vec::new();
        if let Some(ref codec) = self.audio_codec {
            audio_parts.push(codec.clone());
        }
        if let Some(channels) = self.audio_channels {
            audio_parts.push(format!("{}ch", channels));
        }
        let audio = audio_parts.join(" ");

        match (video.is_empty(), audio.is_empty()) {
            (false, false) => format!("{} · {}", video, audio),
            (false, true) => video,
            (true, false) => audio,
            (true, true) => "unknown".to_string(),
        }
    }

    /// Canonical fingerprint of this snapshot. Equality of signatures means
    /// "no material quality change".
    pub fn signature(&self) -> QualitySignature {
        QualitySignature::of(self)
    }
}

const SIGNATURE_MISSING: &str = "-";
const SIGNATURE_SEP: &str = "|";

/// Deterministic, order-stable fingerprint of a [`QualitySnapshot`].
///
/// Built from an explicit field list in a fixed order, with a sentinel for
/// missing values, so equality is purely structural and never depends on
/// presentation fields like display titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QualitySignature(String);

impl QualitySignature {
    pub fn of(snapshot: &QualitySnapshot) -> Self {
        fn field<T: std::fmt::Display>(v: &Option<T>) -> String {
            match v {
                Some(v) => v.to_string(),
                None => SIGNATURE_MISSING.to_string(),
            }
        }
        fn lower(v: &Option<String>) -> String {
            match v {
                Some(v) => v.trim().to_ascii_lowercase(),
                None => SIGNATURE_MISSING.to_string(),
            }
        }

        let resolution = match (snapshot.width, snapshot.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => SIGNATURE_MISSING.to_string(),
        };
        let ranges = if snapshot.dynamic_range.is_empty() {
            SIGNATURE_MISSING.to_string()
        } else {
            snapshot
                .dynamic_range
                .iter()
                .map(|r| r.token())
                .collect::<Vec<_>>()
                .join("+")
        };
        let frame_rate = match snapshot.frame_rate {
            Some(fps) => format!("{:.3}", fps),
            None => SIGNATURE_MISSING.to_string(),
        };

        let parts = [
            lower(&snapshot.video_codec),
            resolution,
            field(&snapshot.video_bitrate),
            ranges,
            field(&snapshot.bit_depth),
            frame_rate,
            lower(&snapshot.audio_codec),
            field(&snapshot.audio_channels),
            field(&snapshot.audio_bitrate),
            lower(&snapshot.container),
            field(&snapshot.size_bytes),
        ];
        Self(parts.join(SIGNATURE_SEP))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for QualitySignature {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for QualitySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_snapshot() -> QualitySnapshot {
        QualitySnapshot {
            video_codec: Some("HEVC".to_string()),
            width: Some(3840),
            height: Some(2160),
            video_bitrate: Some(25_000_000),
            dynamic_range: vec![DynamicRange::DolbyVision, DynamicRange::Hdr10],
            bit_depth: Some(10),
            frame_rate: Some(23.976),
            audio_codec: Some("eac3".to_string()),
            audio_channels: Some(6),
            audio_bitrate: Some(768_000),
            container: Some("mkv".to_string()),
            size_bytes: Some(20_000_000_000),
            run_time_ticks: Some(72_000_000_000),
        }
    }

    #[test]
    fn test_signature_is_stable() {
        let snapshot = full_snapshot();
        assert_eq!(snapshot.signature(), snapshot.signature());
        assert_eq!(
            snapshot.signature().as_str(),
            "hevc|3840x2160|25000000|dv+hdr10|10|23.976|eac3|6|768000|mkv|20000000000"
        );
    }

    #[test]
    fn test_signature_normalizes_codec_case() {
        let mut a = full_snapshot();
        let mut b = full_snapshot();
        a.video_codec = Some("HEVC".to_string());
        b.video_codec = Some("hevc".to_string());
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_differs_on_any_monitored_field() {
        let base = full_snapshot();
        let mut changed = full_snapshot();
        changed.audio_channels = Some(8);
        assert_ne!(base.signature(), changed.signature());

        let mut changed = full_snapshot();
        changed.dynamic_range = vec![DynamicRange::Hdr10];
        assert_ne!(base.signature(), changed.signature());
    }

    #[test]
    fn test_empty_snapshot_is_not_substantial() {
        let snapshot = QualitySnapshot::default();
        assert!(!snapshot.is_substantial());
        assert_eq!(snapshot.signature().as_str(), "-|-|-|-|-|-|-|-|-|-|-");
    }

    #[test]
    fn test_width_alone_is_not_substantial() {
        let snapshot = QualitySnapshot {
            width: Some(1920),
            ..Default::default()
        };
        assert!(!snapshot.is_substantial());
    }

    #[test]
    fn test_resolution_label_buckets() {
        let mut snapshot = full_snapshot();
        assert_eq!(snapshot.resolution_label().as_deref(), Some("2160p"));
        snapshot.width = Some(1920);
        snapshot.height = Some(1080);
        assert_eq!(snapshot.resolution_label().as_deref(), Some("1080p"));
        snapshot.width = Some(640);
        snapshot.height = Some(360);
        assert_eq!(snapshot.resolution_label().as_deref(), Some("640x360"));
    }

    #[test]
    fn test_dynamic_range_ordering() {
        assert!(DynamicRange::DolbyVision > DynamicRange::Hdr10Plus);
        assert!(DynamicRange::Hdr10Plus > DynamicRange::Hdr10);
        assert!(DynamicRange::Hdr10 > DynamicRange::Hlg);
        assert!(DynamicRange::Hlg > DynamicRange::Hdr);
        assert!(DynamicRange::Hdr > DynamicRange::Sdr);
    }

    #[test]
    fn test_summary_formats() {
        let snapshot = full_snapshot();
        assert_eq!(snapshot.summary(), "2160p HEVC Dolby Vision · eac3 6ch");
        assert_eq!(QualitySnapshot::default().summary(), "unknown");
    }
}
