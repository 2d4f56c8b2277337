use crate::commands::music::audio_sources::{AudioSource, LoadResult};
use crate::commands::music::utils::{
    embedded_messages,
    event_handlers::{play_next_track, start_playback},
    music_manager::{MusicError, MusicManager},
    queue_manager::{QueueItem, add_and_take_next_if_idle, queue_length},
};
use crate::{CommandResult, Context};
use tracing::{error, info};

/// Track played when the command carries no query.
const DEFAULT_TRACK_URL: &str = "https://www.youtube.com/watch?v=zOWJqNPeifU";

/// Play a song from YouTube or a direct URL
#[poise::command(slash_command, prefix_command, aliases("test"), category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: Option<String>,
) -> CommandResult {
    let query = query.unwrap_or_else(|| DEFAULT_TRACK_URL.to_string());
    info!("Received play command with query: {}", query);

    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    // Defer the response since audio processing might take time
    ctx.defer().await?;

    // Use the existing voice connection, otherwise join the user's channel
    let call = match MusicManager::get_call(ctx.serenity_context(), guild_id).await {
        Ok(call) => call,
        Err(_) => {
            let channel_id = match MusicManager::get_user_voice_channel(
                ctx.serenity_context(),
                guild_id,
                ctx.author().id,
            ) {
                Ok(channel_id) => channel_id,
                Err(_) => {
                    ctx.send(embedded_messages::not_in_voice_channel()).await?;
                    return Ok(());
                }
            };

            match MusicManager::join_channel(ctx.serenity_context(), guild_id, channel_id).await {
                Ok(call) => call,
                Err(err) => {
                    ctx.send(embedded_messages::failed_to_join_voice_channel(err))
                        .await?;
                    return Ok(());
                }
            }
        }
    };

    // Resolve the query to track metadata
    let requested_by = ctx.author().name.clone();
    let (metadata, playlist) = match AudioSource::resolve(&query, requested_by).await {
        Ok(LoadResult::Track(metadata)) => (metadata, None),
        Ok(LoadResult::Playlist { playlist, first }) => (first, Some(playlist)),
        Ok(LoadResult::NoMatches) => {
            ctx.send(embedded_messages::no_matches(&query)).await?;
            return Ok(());
        }
        Err(err) => {
            error!("Failed to resolve query '{}': {}", query, err);
            ctx.send(embedded_messages::load_failed(&err)).await?;
            return Ok(());
        }
    };

    info!("Resolved query to track: {:?}", metadata.title);

    // Queue the track; when nothing is playing for this guild the queue
    // manager hands it straight back for playback, atomically
    let start_item = add_and_take_next_if_idle(
        guild_id,
        QueueItem {
            metadata: metadata.clone(),
            channel_id: ctx.channel_id(),
        },
    )
    .await?;

    if let Some(item) = start_item {
        if !start_playback(ctx.serenity_context(), guild_id, call.clone(), item).await? {
            // The new entry wasn't playable; try the rest of the queue
            play_next_track(ctx.serenity_context(), guild_id, call).await?;
        }
    }

    let position = queue_length(guild_id).await.unwrap_or(0);

    let reply = match playlist {
        Some(playlist) => embedded_messages::added_playlist_track(&metadata, &playlist),
        None => embedded_messages::added_to_queue(&metadata, position),
    };
    ctx.send(reply).await?;

    Ok(())
}
