//! Quality fingerprinting.
//!
//! Derives a [`QualitySnapshot`] from an item's raw stream attributes. The
//! first video and first audio stream of the first media source are the
//! representative ones, matching how the server itself picks defaults.

use herald_models::{DynamicRange, MediaItem, MediaStream, QualitySnapshot, StreamKind};

/// Build the comparable quality snapshot for an item. An item without media
/// sources yields an empty (non-substantial) snapshot, which downstream
/// logic treats as "server still parsing", never as a change.
pub fn fingerprint(item: &MediaItem) -> QualitySnapshot {
    let Some(source) = item.first_source() else {
        return QualitySnapshot::default();
    };
    let video = source.first_stream(StreamKind::Video);
    let audio = source.first_stream(StreamKind::Audio);

    let run_time_ticks = source.run_time_ticks.or(item.run_time_ticks);
    let video_bitrate = video
        .and_then(|v| v.bit_rate)
        .or(source.bitrate)
        .or_else(|| estimate_bitrate(source.size, run_time_ticks));

    QualitySnapshot {
        video_codec: video.and_then(|v| v.codec.clone()),
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        video_bitrate,
        dynamic_range: video.map(detect_dynamic_range).unwrap_or_default(),
        bit_depth: video.and_then(|v| v.bit_depth),
        frame_rate: video.and_then(|v| v.average_frame_rate),
        audio_codec: audio.and_then(|a| a.codec.clone()),
        audio_channels: audio.and_then(|a| a.channels),
        audio_bitrate: audio.and_then(|a| a.bit_rate),
        container: source.container.clone(),
        size_bytes: source.size,
        run_time_ticks,
    }
}

/// Rough stream bitrate from file size and runtime when the server did not
/// report one (bits per second; ticks are 100ns units).
fn estimate_bitrate(size: Option<i64>, run_time_ticks: Option<i64>) -> Option<i64> {
    let size = size?;
    let ticks = run_time_ticks?;
    let seconds = ticks / 10_000_000;
    if seconds <= 0 {
        return None;
    }
    Some(size.saturating_mul(8) / seconds)
}

/// Detect the dynamic-range profile set of a video stream.
///
/// Servers scatter this across several vendor-specific fields
/// (`VideoRangeType`, `VideoRange`, `ColorTransfer`, codec `Profile`, Dolby
/// Vision markers), so detection is keyword matching over all of them. The
/// result is ordered best-first and deduplicated, with SDR always last as the
/// guaranteed fallback.
pub fn detect_dynamic_range(stream: &MediaStream) -> Vec<DynamicRange> {
    let mut found: Vec<DynamicRange> = Vec::new();

    let haystacks: Vec<String> = [
        stream.video_range_type.as_deref(),
        stream.video_range.as_deref(),
        stream.color_transfer.as_deref(),
        stream.profile.as_deref(),
    ]
    .iter()
    .flatten()
    .map(|s| s.to_ascii_lowercase())
    .collect();

    let contains = |needle: &str| haystacks.iter().any(|h| h.contains(needle));

    if stream.dv_profile.is_some()
        || contains("dolby")
        || contains("dovi")
        || contains("dvhe")
        || contains("dvh1")
    {
        found.push(DynamicRange::DolbyVision);
    }
    if contains("hdr10+") || contains("hdr10plus") {
        found.push(DynamicRange::Hdr10Plus);
    }
    if contains("hdr10") {
        found.push(DynamicRange::Hdr10);
    }
    if contains("hlg") || contains("arib-std-b67") {
        found.push(DynamicRange::Hlg);
    }
    // PQ transfer without an explicit HDR10 marker still means an HDR10-class
    // stream
    if contains("smpte2084") || contains("pq") {
        found.push(DynamicRange::Hdr10);
    }
    // Generic "hdr" only counts when nothing more specific matched; "hdr10"
    // et al. contain the substring too
    if found.is_empty() && contains("hdr") {
        found.push(DynamicRange::Hdr);
    }

    found.push(DynamicRange::Sdr);
    found.sort_by(|a, b| b.cmp(a));
    found.dedup();
    found
}
