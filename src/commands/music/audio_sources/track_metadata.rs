//! Defines the `TrackMetadata` struct, a unified representation of track
//! information resolved from `yt-dlp`, and the in-memory metadata cache.

use crate::commands::music::utils::music_manager::MusicError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::process::Output;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use url::Url;

/// Lazily initialized, thread-safe cache for storing fetched `TrackMetadata`.
/// Uses the track's URL as the key. `DashMap` allows concurrent reads/writes.
pub static AUDIO_CACHE: LazyLock<Arc<DashMap<Url, TrackMetadata>>> =
    LazyLock::new(|| Arc::new(DashMap::new()));

/// Unified representation of metadata for a playable track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackMetadata {
    /// The title of the track.
    pub title: String,
    /// The direct URL to the track, if available (e.g., YouTube video URL).
    pub url: Option<String>,
    /// The duration of the track, if available.
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    /// URL to a thumbnail image for the track, if available.
    pub thumbnail: Option<String>,
    /// The name of the user who requested the track.
    pub requested_by: Option<String>,
}

/// Metadata for a playlist a track was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistMetadata {
    pub title: String,
    pub track_count: usize,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown Track".to_string(),
            url: None,
            duration: None,
            thumbnail: None,
            requested_by: None,
        }
    }
}

impl TrackMetadata {
    /// Creates `TrackMetadata` from YouTube (`yt-dlp`) output, adding the requestor's name.
    pub fn from_youtube(output: Output, requested_by: String) -> Result<TrackMetadata, MusicError> {
        let mut metadata = Self::try_from(output)?;
        metadata.requested_by = Some(requested_by);
        Ok(metadata)
    }

    /// Parses a single `yt-dlp -j` JSON document into `TrackMetadata`.
    pub fn from_json_str(metadata_str: &str) -> Result<TrackMetadata, MusicError> {
        let metadata_json: serde_json::Value =
            serde_json::from_str(metadata_str).map_err(|e| {
                MusicError::AudioSourceError(format!("Failed to parse video metadata: {}", e))
            })?;

        Ok(Self::from_value(&metadata_json))
    }

    /// Extracts track fields from parsed `yt-dlp` JSON, providing defaults
    /// where fields are missing. Flat-playlist entries carry `url` instead
    /// of `webpage_url`.
    pub fn from_value(metadata_json: &serde_json::Value) -> TrackMetadata {
        let title = metadata_json["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let duration = metadata_json["duration"]
            .as_f64()
            .map(Duration::from_secs_f64);

        let thumbnail = metadata_json["thumbnail"].as_str().map(|s| s.to_string());

        let url_str = metadata_json["webpage_url"]
            .as_str()
            .or_else(|| metadata_json["url"].as_str())
            .map(|s| s.to_string());

        let metadata = TrackMetadata {
            title,
            url: url_str.clone(),
            duration,
            thumbnail,
            requested_by: None,
        };

        // If a valid URL was extracted, cache the metadata for later lookups.
        if let Some(url) = url_str {
            if let Ok(url) = Url::parse(&url) {
                AUDIO_CACHE.insert(url, metadata.clone());
            }
        }

        metadata
    }
}

/// Converts the output of `yt-dlp -j` into `TrackMetadata`.
impl TryFrom<Output> for TrackMetadata {
    type Error = MusicError;

    fn try_from(value: Output) -> Result<Self, Self::Error> {
        let metadata_str = String::from_utf8_lossy(&value.stdout);
        Self::from_json_str(&metadata_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    const SAMPLE_JSON: &str = r#"{
        "title": "Never Gonna Give You Up",
        "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "duration": 212.0,
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg"
    }"#;

    #[test]
    fn parses_full_metadata() {
        let metadata = TrackMetadata::from_json_str(SAMPLE_JSON).unwrap();
        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(
            metadata.url.as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
        assert_eq!(metadata.duration, Some(Duration::from_secs(212)));
        assert_eq!(
            metadata.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg")
        );
        assert_eq!(metadata.requested_by, None);
    }

    #[test]
    fn defaults_missing_fields() {
        let metadata = TrackMetadata::from_json_str("{}").unwrap();
        assert_eq!(metadata.title, "Unknown Title");
        assert_eq!(metadata.url, None);
        assert_eq!(metadata.duration, None);
        assert_eq!(metadata.thumbnail, None);
    }

    #[test]
    fn rejects_invalid_json() {
        let result = TrackMetadata::from_json_str("not json");
        assert_matches!(result, Err(MusicError::AudioSourceError(_)));
    }

    #[test]
    fn flat_playlist_entries_use_url_field() {
        let entry = serde_json::json!({
            "title": "Entry",
            "url": "https://www.youtube.com/watch?v=abc123def45",
            "duration": 100.0
        });
        let metadata = TrackMetadata::from_value(&entry);
        assert_eq!(
            metadata.url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123def45")
        );
    }

    #[test]
    fn parsing_populates_cache() {
        let _ = TrackMetadata::from_json_str(SAMPLE_JSON).unwrap();
        let key = Url::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        let cached = AUDIO_CACHE.get(&key).expect("metadata should be cached");
        assert_eq!(cached.title, "Never Gonna Give You Up");
    }
}
