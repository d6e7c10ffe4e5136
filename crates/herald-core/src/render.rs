//! Markdown message rendering.
//!
//! Messages degrade instead of failing: every optional section (overview,
//! runtime, ratings, trailer) is simply omitted when its data is missing.
//! New-item messages carry an arrow-free quality block; update messages show
//! "old → new".

use herald_models::{ContentKind, MediaItem, QualitySnapshot};

use crate::enrichment::RenderExtras;

pub fn title_line(name: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("*{}* *({})*", name, year),
        None => format!("*{}*", name),
    }
}

pub fn runtime_section(item: &MediaItem) -> Option<String> {
    let minutes = item.runtime_minutes()?;
    if minutes <= 0 {
        return None;
    }
    let text = if minutes >= 60 {
        format!("{}h {}min", minutes / 60, minutes % 60)
    } else {
        format!("{}min", minutes)
    };
    Some(format!("Runtime\n{}", text))
}

pub fn quality_section(snapshot: &QualitySnapshot) -> Option<String> {
    if !snapshot.is_substantial() {
        return None;
    }
    Some(format!("Quality\n{}", snapshot.summary()))
}

pub fn quality_change_section(old: &QualitySnapshot, new: &QualitySnapshot) -> String {
    format!("Quality\n{} → {}", old.summary(), new.summary())
}

pub fn ratings_section(kind: ContentKind, extras: &RenderExtras) -> Option<String> {
    let ratings = extras.ratings.as_deref()?;
    let label = match kind {
        ContentKind::Movie => "Ratings movie",
        ContentKind::Series | ContentKind::Season | ContentKind::Episode => "Ratings show",
        _ => "Ratings",
    };
    Some(format!("*⭐{}⭐:*\n{}", label, ratings))
}

pub fn trailer_section(extras: &RenderExtras) -> Option<String> {
    let url = extras.trailer_url.as_deref()?;
    Some(format!("[🎥]({url})[Trailer]({url})"))
}

/// Join non-empty sections with blank lines, the layout every notification
/// uses.
pub fn join_sections(sections: Vec<Option<String>>) -> String {
    sections
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_new_movie(
    item: &MediaItem,
    snapshot: &QualitySnapshot,
    extras: &RenderExtras,
) -> String {
    join_sections(vec![
        Some("*🍿New Movie Added🍿*".to_string()),
        Some(title_line(&item.display_title(), item.year)),
        item.overview.clone(),
        runtime_section(item),
        quality_section(snapshot),
        ratings_section(ContentKind::Movie, extras),
        trailer_section(extras),
    ])
}

pub fn render_new_album(item: &MediaItem, extras: &RenderExtras) -> String {
    let mb_link = item
        .provider_ids
        .musicbrainz_album
        .as_deref()
        .map(|id| format!("[MusicBrainz](https://musicbrainz.org/release/{})", id));
    join_sections(vec![
        Some("*🎵 New Album Added 🎵*".to_string()),
        item.artist.as_deref().map(|a| format!("*{}*", a)),
        Some(title_line(&item.display_title(), item.year)),
        item.overview.clone(),
        runtime_section(item),
        ratings_section(ContentKind::Album, extras),
        mb_link,
    ])
}

pub fn render_new_book(item: &MediaItem, _extras: &RenderExtras) -> String {
    join_sections(vec![
        Some("*📚 New Book Added 📚*".to_string()),
        Some(title_line(&item.display_title(), item.year)),
        item.overview.clone(),
    ])
}

pub fn render_new_music_video(
    item: &MediaItem,
    snapshot: &QualitySnapshot,
    _extras: &RenderExtras,
) -> String {
    join_sections(vec![
        Some("*🎬 New Music Video Added 🎬*".to_string()),
        item.artist.as_deref().map(|a| format!("*{}*", a)),
        Some(title_line(&item.display_title(), item.year)),
        item.overview.clone(),
        quality_section(snapshot),
    ])
}

pub fn render_quality_update(
    item: &MediaItem,
    old: &QualitySnapshot,
    new: &QualitySnapshot,
) -> String {
    join_sections(vec![
        Some("*⬆ Quality Updated ⬆*".to_string()),
        Some(title_line(&item.display_title(), item.year)),
        Some(quality_change_section(old, new)),
    ])
}

/// "Added X of Y episodes" when the expected total is known, "Added X
/// episodes" otherwise.
pub fn season_progress_line(present: i64, total: i64) -> String {
    if total > 0 {
        format!("Added {} of {} episodes", present, total)
    } else {
        format!("Added {} episodes", present)
    }
}

pub fn render_season_progress(
    series_name: &str,
    year: Option<i32>,
    season_number: Option<i32>,
    present: i64,
    total: i64,
    overview: Option<&str>,
    extras: &RenderExtras,
) -> String {
    join_sections(vec![
        Some("*New Episodes Added*".to_string()),
        Some(title_line(series_name, year)),
        season_number.map(|n| format!("*Season {}*", n)),
        Some(season_progress_line(present, total)),
        overview.map(str::to_string),
        ratings_section(ContentKind::Season, extras),
        trailer_section(extras),
    ])
}

pub fn render_season_quality_update(
    series_name: &str,
    season_number: Option<i32>,
    episode_count: i64,
) -> String {
    join_sections(vec![
        Some("*⬆ Season Quality Updated ⬆*".to_string()),
        season_number
            .map(|n| format!("*{}* *Season {}*", series_name, n))
            .or_else(|| Some(format!("*{}*", series_name))),
        Some(format!("{} episodes now at new quality", episode_count)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_models::DynamicRange;

    fn movie() -> MediaItem {
        MediaItem {
            id: "item1".to_string(),
            kind: Some(ContentKind::Movie),
            name: "Foo (2020)".to_string(),
            year: Some(2020),
            overview: Some("A movie about foo.".to_string()),
            run_time_ticks: Some(112 * 60 * 10_000_000),
            ..Default::default()
        }
    }

    fn snapshot() -> QualitySnapshot {
        QualitySnapshot {
            video_codec: Some("h264".to_string()),
            width: Some(1920),
            height: Some(1080),
            dynamic_range: vec![DynamicRange::Sdr],
            audio_codec: Some("aac".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_movie_message_has_no_arrow() {
        let message = render_new_movie(&movie(), &snapshot(), &RenderExtras::none());
        assert!(message.starts_with("*🍿New Movie Added🍿*"));
        assert!(message.contains("*Foo* *(2020)*"));
        assert!(message.contains("A movie about foo."));
        assert!(message.contains("Runtime\n1h 52min"));
        assert!(message.contains("Quality\n1080p h264 SDR · aac"));
        assert!(!message.contains('→'));
    }

    #[test]
    fn test_update_message_shows_transition() {
        let old = snapshot();
        let mut new = snapshot();
        new.video_codec = Some("hevc".to_string());
        new.width = Some(3840);
        new.height = Some(2160);
        new.dynamic_range = vec![DynamicRange::Hdr10];
        let message = render_quality_update(&movie(), &old, &new);
        assert!(message.contains("1080p h264 SDR"));
        assert!(message.contains('→'));
        assert!(message.contains("2160p hevc HDR10"));
    }

    #[test]
    fn test_missing_enrichment_degrades_silently() {
        let message = render_new_movie(&movie(), &snapshot(), &RenderExtras::none());
        assert!(!message.contains("Ratings"));
        assert!(!message.contains("Trailer"));
    }

    #[test]
    fn test_enrichment_sections_appear_when_present() {
        let extras = RenderExtras {
            ratings: Some("- IMDb: 7.8\n- Rotten Tomatoes: 84%".to_string()),
            trailer_url: Some("https://www.youtube.com/watch?v=abc".to_string()),
        };
        let message = render_new_movie(&movie(), &snapshot(), &extras);
        assert!(message.contains("*⭐Ratings movie⭐:*\n- IMDb: 7.8"));
        assert!(message.contains("[Trailer](https://www.youtube.com/watch?v=abc)"));
    }

    #[test]
    fn test_empty_snapshot_omits_quality_block() {
        let message = render_new_movie(&movie(), &QualitySnapshot::default(), &RenderExtras::none());
        assert!(!message.contains("Quality"));
    }

    #[test]
    fn test_season_progress_wording() {
        assert_eq!(season_progress_line(3, 10), "Added 3 of 10 episodes");
        assert_eq!(season_progress_line(3, 0), "Added 3 episodes");
    }

    #[test]
    fn test_season_progress_message() {
        let message = render_season_progress(
            "Foo",
            Some(2020),
            Some(1),
            7,
            10,
            Some("A show about foo."),
            &RenderExtras::none(),
        );
        assert!(message.contains("*New Episodes Added*"));
        assert!(message.contains("*Season 1*"));
        assert!(message.contains("Added 7 of 10 episodes"));
    }
}
