use crate::commands::music::audio_sources::track_metadata::TrackMetadata;
use serenity::model::id::ChannelId;
use serenity::model::id::GuildId;
use songbird::tracks::TrackHandle;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::LazyLock;
use tokio::sync::Mutex;

use super::music_manager::MusicError;

/// A queue item: track metadata plus the channel the request came from
pub struct QueueItem {
    pub metadata: TrackMetadata,
    /// Channel to send playback notices to for this track
    pub channel_id: ChannelId,
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, MusicError>;

/// Manages the queue of tracks for each guild
pub struct QueueManager {
    // Map of guild ID to queue
    queues: HashMap<GuildId, VecDeque<QueueItem>>,
    // Map of guild ID to current track. The handle is None while the slot is
    // reserved but playback has not produced a TrackHandle yet.
    current_tracks: HashMap<GuildId, (Option<TrackHandle>, TrackMetadata)>,
}

impl QueueManager {
    /// Create a new queue manager
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
            current_tracks: HashMap::new(),
        }
    }

    /// Add a track to the queue for a guild
    pub fn add(&mut self, guild_id: GuildId, item: QueueItem) {
        let queue = self.queues.entry(guild_id).or_default();
        queue.push_back(item);
    }

    /// Get the next track in the queue for a guild
    pub fn next(&mut self, guild_id: GuildId) -> Option<QueueItem> {
        // The previous track is over either way
        self.current_tracks.remove(&guild_id);

        self.take_next_if_idle(guild_id)
    }

    /// Add a track and, when nothing is playing for the guild, take it
    /// straight back off the queue for playback. The whole decision happens
    /// on one `&mut self`, so two concurrent play requests can't both see an
    /// idle guild.
    pub fn add_and_take_next_if_idle(
        &mut self,
        guild_id: GuildId,
        item: QueueItem,
    ) -> Option<QueueItem> {
        self.add(guild_id, item);
        self.take_next_if_idle(guild_id)
    }

    /// Pop the next queued track and reserve the playing slot, unless a
    /// track is already playing (or reserved) for the guild.
    fn take_next_if_idle(&mut self, guild_id: GuildId) -> Option<QueueItem> {
        if self.current_tracks.contains_key(&guild_id) {
            return None;
        }

        let item = self.queues.get_mut(&guild_id)?.pop_front()?;
        self.current_tracks
            .insert(guild_id, (None, item.metadata.clone()));
        Some(item)
    }

    /// Clear the queue for a guild
    pub fn clear(&mut self, guild_id: GuildId) {
        self.queues.remove(&guild_id);
        self.current_tracks.remove(&guild_id);
    }

    /// Get the current queue for a guild
    pub fn get_queue(&self, guild_id: GuildId) -> Vec<&TrackMetadata> {
        if let Some(queue) = self.queues.get(&guild_id) {
            queue.iter().map(|item| &item.metadata).collect()
        } else {
            Vec::new()
        }
    }

    /// Set the current track for a guild
    pub fn set_current_track(
        &mut self,
        guild_id: GuildId,
        track: TrackHandle,
        metadata: TrackMetadata,
    ) {
        self.current_tracks.insert(guild_id, (Some(track), metadata));
    }

    /// Get the current track for a guild
    pub fn get_current_track(
        &self,
        guild_id: GuildId,
    ) -> Option<&(Option<TrackHandle>, TrackMetadata)> {
        self.current_tracks.get(&guild_id)
    }

    /// Get the number of tracks in the queue for a guild
    pub fn len(&self, guild_id: GuildId) -> usize {
        match self.queues.get(&guild_id) {
            Some(queue) => queue.len(),
            None => 0,
        }
    }
}

// Global queue manager wrapped in a mutex for thread safety
pub static QUEUE_MANAGER: LazyLock<Arc<Mutex<QueueManager>>> =
    LazyLock::new(|| Arc::new(Mutex::new(QueueManager::new())));

/// Helper functions for working with the global queue manager
pub async fn add_and_take_next_if_idle(
    guild_id: GuildId,
    item: QueueItem,
) -> QueueResult<Option<QueueItem>> {
    let mut manager = QUEUE_MANAGER.lock().await;
    Ok(manager.add_and_take_next_if_idle(guild_id, item))
}

pub async fn get_next_track(guild_id: GuildId) -> QueueResult<Option<QueueItem>> {
    let mut manager = QUEUE_MANAGER.lock().await;
    Ok(manager.next(guild_id))
}

pub async fn clear_queue(guild_id: GuildId) -> QueueResult<()> {
    let mut manager = QUEUE_MANAGER.lock().await;
    manager.clear(guild_id);
    Ok(())
}

pub async fn set_current_track(
    guild_id: GuildId,
    track: TrackHandle,
    metadata: TrackMetadata,
) -> QueueResult<()> {
    let mut manager = QUEUE_MANAGER.lock().await;
    manager.set_current_track(guild_id, track, metadata);
    Ok(())
}

pub async fn get_current_track(
    guild_id: GuildId,
) -> QueueResult<Option<(Option<TrackHandle>, TrackMetadata)>> {
    let manager = QUEUE_MANAGER.lock().await;
    Ok(manager.get_current_track(guild_id).cloned())
}

pub async fn queue_length(guild_id: GuildId) -> QueueResult<usize> {
    let manager = QUEUE_MANAGER.lock().await;
    Ok(manager.len(guild_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(title: &str) -> QueueItem {
        QueueItem {
            metadata: TrackMetadata {
                title: title.to_string(),
                ..Default::default()
            },
            channel_id: ChannelId::new(42),
        }
    }

    #[test]
    fn queue_is_fifo() {
        let mut manager = QueueManager::new();
        let guild_id = GuildId::new(1);

        manager.add(guild_id, item("first"));
        manager.add(guild_id, item("second"));
        assert_eq!(manager.len(guild_id), 2);

        let next = manager.next(guild_id).unwrap();
        assert_eq!(next.metadata.title, "first");
        let next = manager.next(guild_id).unwrap();
        assert_eq!(next.metadata.title, "second");
        assert!(manager.next(guild_id).is_none());
    }

    #[test]
    fn only_one_of_two_racing_adds_starts_playback() {
        let mut manager = QueueManager::new();
        let guild_id = GuildId::new(1);

        let first = manager.add_and_take_next_if_idle(guild_id, item("first"));
        assert_eq!(first.unwrap().metadata.title, "first");
        // The playing slot is reserved before any track handle exists
        let (handle, metadata) = manager.get_current_track(guild_id).unwrap();
        assert!(handle.is_none());
        assert_eq!(metadata.title, "first");

        // A second request arriving before playback produced a handle must
        // queue up instead of starting a second track
        let second = manager.add_and_take_next_if_idle(guild_id, item("second"));
        assert!(second.is_none());
        assert_eq!(manager.len(guild_id), 1);

        // Track end advances to the queued item
        let next = manager.next(guild_id).unwrap();
        assert_eq!(next.metadata.title, "second");
        assert_eq!(manager.len(guild_id), 0);
    }

    #[test]
    fn advancing_reserves_the_playing_slot() {
        let mut manager = QueueManager::new();
        let guild_id = GuildId::new(3);

        manager.add(guild_id, item("a"));
        manager.add(guild_id, item("b"));

        let next = manager.next(guild_id).unwrap();
        assert_eq!(next.metadata.title, "a");
        assert!(manager.get_current_track(guild_id).is_some());
        assert!(
            manager
                .add_and_take_next_if_idle(guild_id, item("c"))
                .is_none()
        );
    }

    #[test]
    fn queues_are_per_guild() {
        let mut manager = QueueManager::new();
        manager.add(GuildId::new(1), item("one"));
        manager.add(GuildId::new(2), item("two"));

        assert_eq!(manager.len(GuildId::new(1)), 1);
        assert_eq!(manager.len(GuildId::new(2)), 1);

        let next = manager.next(GuildId::new(2)).unwrap();
        assert_eq!(next.metadata.title, "two");
        assert_eq!(manager.len(GuildId::new(1)), 1);
    }

    #[test]
    fn clear_empties_queue() {
        let mut manager = QueueManager::new();
        let guild_id = GuildId::new(1);

        manager.add(guild_id, item("a"));
        manager.add(guild_id, item("b"));
        manager.clear(guild_id);

        assert_eq!(manager.len(guild_id), 0);
        assert!(manager.next(guild_id).is_none());
        assert!(manager.get_current_track(guild_id).is_none());
    }

    #[test]
    fn get_queue_preserves_order() {
        let mut manager = QueueManager::new();
        let guild_id = GuildId::new(7);

        manager.add(guild_id, item("a"));
        manager.add(guild_id, item("b"));
        manager.add(guild_id, item("c"));

        let titles: Vec<&str> = manager
            .get_queue(guild_id)
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_guild_has_empty_queue() {
        let manager = QueueManager::new();
        let guild_id = GuildId::new(99);

        assert_eq!(manager.len(guild_id), 0);
        assert!(manager.get_queue(guild_id).is_empty());
        assert!(manager.get_current_track(guild_id).is_none());
    }
}
