use std::sync::Arc;

use crate::{
    Error, HTTP_CLIENT,
    commands::music::utils::{
        embedded_messages,
        music_manager::MusicManager,
        queue_manager::{QueueItem, clear_queue, get_current_track, get_next_track, set_current_track},
    },
};
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::input::YoutubeDl;
use tracing::{error, info, warn};

/// Event handler for when a song ends
pub struct SongEndNotifier {
    pub ctx: serenity::Context,
    pub guild_id: serenity::GuildId,
    pub call: Arc<serenity::prelude::Mutex<songbird::Call>>,
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            self.handle_track_end().await;
        }
        None
    }
}

impl SongEndNotifier {
    async fn handle_track_end(&self) {
        info!("Track ended for guild {}", self.guild_id);

        match play_next_track(&self.ctx, self.guild_id, self.call.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                // A play request may have claimed the guild between the
                // empty-queue check and now
                if get_current_track(self.guild_id)
                    .await
                    .is_ok_and(|current| current.is_some())
                {
                    return;
                }

                // Queue drained, leave the voice channel
                info!(
                    "Queue empty for guild {}, leaving voice channel",
                    self.guild_id
                );
                if let Err(e) = clear_queue(self.guild_id).await {
                    warn!("Failed to clear queue for guild {}: {}", self.guild_id, e);
                }
                if let Err(e) = MusicManager::leave_channel(&self.ctx, self.guild_id).await {
                    warn!(
                        "Failed to leave voice channel for guild {}: {}",
                        self.guild_id, e
                    );
                }
            }
            Err(e) => {
                error!(
                    "Failed to play next track for guild {}: {}",
                    self.guild_id, e
                );
            }
        }
    }
}

/// Event handler for when a track errors during playback. Advancement to the
/// next track happens through the end event, so this only notifies the
/// requesting channel.
pub struct TrackErrorNotifier {
    pub ctx: serenity::Context,
    pub guild_id: serenity::GuildId,
    pub channel_id: serenity::ChannelId,
    pub title: String,
}

#[async_trait]
impl songbird::EventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            warn!(
                "Track '{}' errored during playback for guild {}",
                self.title, self.guild_id
            );
            if let Err(e) = embedded_messages::send_track_errored(
                self.ctx.http.clone(),
                self.channel_id,
                &self.title,
            )
            .await
            {
                error!("Failed to send track error notice: {}", e);
            }
        }
        None
    }
}

/// Start the next track in the queue for a guild.
/// Returns true if a track was started, false if the queue was empty.
pub async fn play_next_track(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    call: Arc<serenity::prelude::Mutex<songbird::Call>>,
) -> Result<bool, Error> {
    // Tracks without a URL can't be played; keep popping until one can be
    loop {
        let item = match get_next_track(guild_id).await? {
            Some(item) => item,
            None => {
                info!("No more tracks in queue for guild {}", guild_id);
                return Ok(false);
            }
        };

        if start_playback(ctx, guild_id, call.clone(), item).await? {
            return Ok(true);
        }
    }
}

/// Begin playback of an item already taken off the queue.
/// Returns false when the item carries no URL and was skipped.
pub async fn start_playback(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    call: Arc<serenity::prelude::Mutex<songbird::Call>>,
    item: QueueItem,
) -> Result<bool, Error> {
    let url = match &item.metadata.url {
        Some(url) => url.clone(),
        None => {
            warn!(
                "Track '{}' has no URL, skipping to next in queue",
                item.metadata.title
            );
            return Ok(false);
        }
    };

    info!("Starting track '{}' for guild {}", item.metadata.title, guild_id);

    let input = YoutubeDl::new(HTTP_CLIENT.clone(), url);
    let track_handle = {
        let mut handler = call.lock().await;
        handler.play_input(input.into())
    };

    set_current_track(guild_id, track_handle.clone(), item.metadata.clone()).await?;

    let _ = track_handle.add_event(
        songbird::Event::Track(songbird::TrackEvent::End),
        SongEndNotifier {
            ctx: ctx.clone(),
            guild_id,
            call: call.clone(),
        },
    );

    let _ = track_handle.add_event(
        songbird::Event::Track(songbird::TrackEvent::Error),
        TrackErrorNotifier {
            ctx: ctx.clone(),
            guild_id,
            channel_id: item.channel_id,
            title: item.metadata.title.clone(),
        },
    );

    // Announce to the channel the track was requested from
    if let Err(e) =
        embedded_messages::send_now_playing(ctx.http.clone(), item.channel_id, &item.metadata)
            .await
    {
        warn!("Failed to send now playing notice: {}", e);
    }

    Ok(true)
}
