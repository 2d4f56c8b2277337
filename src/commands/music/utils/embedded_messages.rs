//! Embed builders for every user-facing playback message.

use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{ChannelId, CreateEmbed, CreateMessage};
use std::sync::Arc;

use super::{format_duration, music_manager::MusicError};
use crate::Error;
use crate::commands::music::audio_sources::{PlaylistMetadata, TrackMetadata};

/// Parse the metadata for the now playing and added to queue embeds
fn parse_metadata(metadata: &TrackMetadata) -> (String, String, String) {
    let title = metadata.title.clone();
    let url = metadata.url.clone().unwrap_or_else(|| "#".to_string());
    let duration_str = metadata
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    (title, url, duration_str)
}

/// Create an embed for when a song is now playing
pub fn now_playing(metadata: &TrackMetadata) -> CreateEmbed {
    let (title, url, duration_str) = parse_metadata(metadata);

    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(0x00ff00);

    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Create a reply for when a song is added to the queue
pub fn added_to_queue(metadata: &TrackMetadata, position: usize) -> CreateReply {
    let (title, url, duration_str) = parse_metadata(metadata);

    let mut embed = CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(0x00ff00);

    if position > 0 {
        embed = embed.field("Position", format!("`#{}`", position), true);
    }

    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

/// Create a reply for when the first track of a playlist is queued
pub fn added_playlist_track(metadata: &TrackMetadata, playlist: &PlaylistMetadata) -> CreateReply {
    let (title, url, duration_str) = parse_metadata(metadata);

    let mut embed = CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!(
            "[{}]({}) (first track of playlist **{}**)",
            title, url, playlist.title
        ))
        .field("Duration", format!("`{}`", duration_str), true)
        .field(
            "Playlist",
            format!("`{} tracks`", playlist.track_count),
            true,
        )
        .color(0x00ff00);

    if let Some(thumbnail) = &metadata.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    CreateReply::default().embed(embed)
}

/// Create a reply for when nothing matched the query
pub fn no_matches(query: &str) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(format!("Couldn't find anything for `{}`", query))
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Create a reply for a failed track load. Resolver rejections get a
/// friendly message; anything else is surfaced as an internal failure.
pub fn load_failed(err: &MusicError) -> CreateReply {
    let description = match err {
        MusicError::AudioSourceError(msg) => {
            format!("Sorry, I can't play that:\n```{}```", msg)
        }
        other => format!("Something went horribly wrong:\n```{}```", other),
    };

    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Create a reply for when the invoking user is not in a voice channel
pub fn not_in_voice_channel() -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description("You are not in a voice channel!")
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Create a reply for a failed voice channel join
pub fn failed_to_join_voice_channel(err: MusicError) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(format!("Failed to join voice channel: {}", err))
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Send the now playing notice to the channel the track was requested from
pub async fn send_now_playing(
    http: Arc<serenity::Http>,
    channel_id: ChannelId,
    metadata: &TrackMetadata,
) -> Result<(), Error> {
    let message = CreateMessage::new().embed(now_playing(metadata));
    channel_id.send_message(http, message).await?;
    Ok(())
}

/// Notify the requesting channel that a track failed during playback
pub async fn send_track_errored(
    http: Arc<serenity::Http>,
    channel_id: ChannelId,
    title: &str,
) -> Result<(), Error> {
    let message = CreateMessage::new().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(format!(
                "Something went wrong while playing **{}**.\nWill skip to the next song.",
                title
            ))
            .color(0xff0000),
    );
    channel_id.send_message(http, message).await?;
    Ok(())
}
