//! Fetches track metadata from YouTube using the `yt-dlp` command-line tool:
//! single videos, search terms, and flat playlist listings.

use std::process::{Command, Output};

use tracing::info;
use url::Url;

use super::{AudioSourceResult, LoadResult, PlaylistMetadata, TrackMetadata};
use crate::commands::music::utils::music_manager::MusicError;

/// The main struct implementing YouTube lookups (via `yt-dlp`).
#[derive(Default)]
pub struct YoutubeApi;

impl YoutubeApi {
    /// Checks if the input string is a valid YouTube URL (watch page or youtu.be).
    pub fn is_youtube_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => {
                url.host_str().is_some_and(|host| {
                    host == "www.youtube.com" || host == "youtube.com" || host == "m.youtube.com"
                }) && url.path().starts_with("/watch")
                    || url.host_str() == Some("youtu.be")
            }
            Err(_) => false,
        }
    }

    /// Checks if the input string is a YouTube playlist URL, either a
    /// `/playlist` page or a watch URL carrying a `list` parameter.
    pub fn is_playlist_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => {
                let is_youtube_host = url.host_str().is_some_and(|host| {
                    host == "www.youtube.com" || host == "youtube.com" || host == "m.youtube.com"
                });
                is_youtube_host
                    && (url.path().starts_with("/playlist")
                        || url.query_pairs().any(|(key, _)| key == "list"))
            }
            Err(_) => false,
        }
    }

    /// Fetches metadata for a single video URL.
    pub fn from_url(url: &str, requested_by: String) -> AudioSourceResult<TrackMetadata> {
        info!("Creating YouTube audio source for URL: {}", url);

        let output = Self::run_ytdlp(&["-j", "--no-playlist", url])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp failed for {}: {}",
                url,
                stderr.trim()
            )));
        }

        TrackMetadata::from_youtube(output, requested_by)
    }

    /// Fetches metadata for the first YouTube search result for a given
    /// search term. Returns `None` when the search yields nothing.
    pub fn from_search(
        search_term: &str,
        requested_by: String,
    ) -> AudioSourceResult<Option<TrackMetadata>> {
        info!("Creating audio source from search term: {}", search_term);
        let search_param = format!("ytsearch:{}", search_term);

        let output = Self::run_ytdlp(&["-j", "--no-playlist", &search_param])?;
        Self::parse_search_output(output, requested_by)
    }

    /// Interprets a `yt-dlp` search run. A failing run is a load failure;
    /// only a successful run with empty stdout means nothing matched.
    pub fn parse_search_output(
        output: Output,
        requested_by: String,
    ) -> AudioSourceResult<Option<TrackMetadata>> {
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp search failed: {}",
                stderr.trim()
            )));
        }

        // yt-dlp prints nothing when the search comes up empty
        if output.stdout.is_empty() {
            return Ok(None);
        }

        TrackMetadata::from_youtube(output, requested_by).map(Some)
    }

    /// Fetches a flat playlist listing and resolves its first entry.
    pub fn from_playlist(url: &str, requested_by: String) -> AudioSourceResult<LoadResult> {
        info!("Creating audio source from playlist URL: {}", url);

        let output = Self::run_ytdlp(&["-j", "--flat-playlist", url])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp failed for playlist {}: {}",
                url,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_playlist_output(&stdout, requested_by)
    }

    /// Parses `yt-dlp --flat-playlist -j` output (one JSON document per
    /// line) into a `LoadResult`.
    pub fn parse_playlist_output(
        stdout: &str,
        requested_by: String,
    ) -> AudioSourceResult<LoadResult> {
        let entries: Vec<serde_json::Value> = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()
            .map_err(|e| {
                MusicError::AudioSourceError(format!("Failed to parse playlist metadata: {}", e))
            })?;

        let first_entry = match entries.first() {
            Some(entry) => entry,
            None => return Ok(LoadResult::NoMatches),
        };

        let playlist_title = first_entry["playlist_title"]
            .as_str()
            .unwrap_or("Unknown Playlist")
            .to_string();

        let mut first = TrackMetadata::from_value(first_entry);
        first.requested_by = Some(requested_by);

        Ok(LoadResult::Playlist {
            playlist: PlaylistMetadata {
                title: playlist_title,
                track_count: entries.len(),
            },
            first,
        })
    }

    /// Executes `yt-dlp` with the given arguments. A spawn failure means the
    /// tool is missing or broken, which is an internal error rather than a
    /// bad request.
    fn run_ytdlp(args: &[&str]) -> AudioSourceResult<Output> {
        Command::new("yt-dlp")
            .args(args)
            .output()
            .map_err(|e| MusicError::Internal(format!("Failed to run yt-dlp: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("https://www.youtube.com/watch?v=zOWJqNPeifU", true)]
    #[test_case("https://youtu.be/zOWJqNPeifU", true)]
    #[test_case("https://m.youtube.com/watch?v=zOWJqNPeifU", true)]
    #[test_case("https://example.com/watch?v=zOWJqNPeifU", false)]
    #[test_case("https://www.youtube.com/playlist?list=PL123", false)]
    #[test_case("plain search text", false)]
    fn recognizes_youtube_urls(query: &str, expected: bool) {
        assert_eq!(YoutubeApi::is_youtube_url(query), expected);
    }

    #[test_case("https://www.youtube.com/playlist?list=PL123", true)]
    #[test_case("https://www.youtube.com/watch?v=abc&list=PL123", true)]
    #[test_case("https://www.youtube.com/watch?v=abc", false)]
    #[test_case("https://example.com/playlist?list=PL123", false)]
    #[test_case("not a url", false)]
    fn recognizes_playlist_urls(query: &str, expected: bool) {
        assert_eq!(YoutubeApi::is_playlist_url(query), expected);
    }

    #[test]
    fn parses_playlist_entries() {
        let stdout = concat!(
            r#"{"title":"First","url":"https://www.youtube.com/watch?v=aaa","playlist_title":"Mix","duration":60.0}"#,
            "\n",
            r#"{"title":"Second","url":"https://www.youtube.com/watch?v=bbb","playlist_title":"Mix","duration":90.0}"#,
            "\n",
        );

        let result = YoutubeApi::parse_playlist_output(stdout, "tester".to_string()).unwrap();
        assert_matches!(result, LoadResult::Playlist { playlist, first } => {
            assert_eq!(playlist.title, "Mix");
            assert_eq!(playlist.track_count, 2);
            assert_eq!(first.title, "First");
            assert_eq!(first.requested_by.as_deref(), Some("tester"));
        });
    }

    #[test]
    fn empty_playlist_has_no_matches() {
        let result = YoutubeApi::parse_playlist_output("", "tester".to_string()).unwrap();
        assert_eq!(result, LoadResult::NoMatches);
    }

    #[test]
    fn garbled_playlist_output_is_an_error() {
        let result = YoutubeApi::parse_playlist_output("garbage\n", "tester".to_string());
        assert_matches!(result, Err(MusicError::AudioSourceError(_)));
    }

    fn ytdlp_output(exit_code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        use std::process::ExitStatus;

        Output {
            status: ExitStatus::from_raw(exit_code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn failed_search_run_is_an_error_not_a_miss() {
        let output = ytdlp_output(1, "", "ERROR: Unable to download webpage");
        let result = YoutubeApi::parse_search_output(output, "tester".to_string());
        assert_matches!(result, Err(MusicError::AudioSourceError(msg)) => {
            assert!(msg.contains("Unable to download webpage"));
        });
    }

    #[test]
    fn empty_successful_search_has_no_matches() {
        let output = ytdlp_output(0, "", "");
        let result = YoutubeApi::parse_search_output(output, "tester".to_string()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn successful_search_yields_metadata() {
        let output = ytdlp_output(
            0,
            r#"{"title":"Found","webpage_url":"https://www.youtube.com/watch?v=ccc","duration":120.0}"#,
            "",
        );
        let metadata = YoutubeApi::parse_search_output(output, "tester".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(metadata.title, "Found");
        assert_eq!(metadata.requested_by.as_deref(), Some("tester"));
    }
}
