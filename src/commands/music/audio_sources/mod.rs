pub(crate) mod track_metadata;
pub(crate) mod youtube;

pub use track_metadata::{AUDIO_CACHE, PlaylistMetadata, TrackMetadata};

use crate::commands::music::utils::music_manager::MusicError;
use tracing::debug;
use url::Url;
use youtube::YoutubeApi;

/// Result type for audio source operations
pub type AudioSourceResult<T> = Result<T, MusicError>;

/// Outcome of resolving a play query.
#[derive(Debug, PartialEq)]
pub enum LoadResult {
    /// A single playable track.
    Track(TrackMetadata),
    /// A playlist; only its first track is queued.
    Playlist {
        playlist: PlaylistMetadata,
        first: TrackMetadata,
    },
    /// Nothing matched the query.
    NoMatches,
}

/// Audio source utilities for handling different types of audio inputs
pub struct AudioSource;

impl AudioSource {
    /// Check if a query is an http(s) URL
    pub fn is_url(query: &str) -> bool {
        Url::parse(query).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    /// Resolve a query to track metadata: direct URL, playlist URL, or a
    /// YouTube search term.
    pub async fn resolve(query: &str, requested_by: String) -> AudioSourceResult<LoadResult> {
        if Self::is_url(query) {
            if YoutubeApi::is_playlist_url(query) {
                return YoutubeApi::from_playlist(query, requested_by);
            }

            // Serve from the metadata cache when we've resolved this URL before
            if let Ok(url) = Url::parse(query) {
                if let Some(cached) = AUDIO_CACHE.get(&url) {
                    debug!("Metadata cache hit for URL: {}", query);
                    let mut metadata = cached.value().clone();
                    metadata.requested_by = Some(requested_by);
                    return Ok(LoadResult::Track(metadata));
                }
            }

            let metadata = YoutubeApi::from_url(query, requested_by)?;
            return Ok(LoadResult::Track(metadata));
        }

        match YoutubeApi::from_search(query, requested_by)? {
            Some(metadata) => Ok(LoadResult::Track(metadata)),
            None => Ok(LoadResult::NoMatches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("https://www.youtube.com/watch?v=zOWJqNPeifU", true)]
    #[test_case("http://example.com/track.mp3", true)]
    #[test_case("never gonna give you up", false)]
    #[test_case("ftp://example.com/file", false)]
    #[test_case("", false)]
    fn classifies_urls(query: &str, expected: bool) {
        assert_eq!(AudioSource::is_url(query), expected);
    }
}
