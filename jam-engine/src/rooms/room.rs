use std::collections::HashSet;

use crate::{
    protocol::{PlaybackState, SerializedRoom, ServerMessage, Track, User},
    util::AVATAR_PALETTE,
};

/// The maximum crossfade duration in seconds.
const MAX_CROSSFADE: f64 = 8.0;

/// One listening session: participants, queue, the virtual playback clock,
/// skip votes, and the crossfade setting.
///
/// The room never performs I/O. Mutations take the current wall time as a
/// parameter and the caller broadcasts whatever messages the mutation calls
/// for, so every transition is deterministic under test.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub created_at: u64,
    host_id: Option<String>,
    queue: Vec<Track>,
    current_index: Option<usize>,
    playback_state: PlaybackState,
    /// Anchor of the virtual clock. Only meaningful while playing.
    started_at: u64,
    /// The authoritative track position. Only meaningful while paused.
    elapsed: f64,
    users: Vec<User>,
    skip_votes: HashSet<String>,
    crossfade_duration: f64,
}

impl Room {
    pub fn new(id: String, name: String, now: u64) -> Self {
        Self {
            id,
            name,
            created_at: now,
            host_id: None,
            queue: Vec::new(),
            current_index: None,
            playback_state: PlaybackState::Paused,
            started_at: 0,
            elapsed: 0.,
            users: Vec::new(),
            skip_votes: HashSet::new(),
            crossfade_duration: 0.,
        }
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.users.iter().map(|u| u.id.clone()).collect()
    }

    pub fn user_name(&self, user_id: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.name.as_str())
    }

    /// The color the next joiner gets, determined by join order.
    pub fn next_color(&self) -> &'static str {
        AVATAR_PALETTE[self.users.len() % AVATAR_PALETTE.len()]
    }

    /// Registers a user. The first user to enter becomes the host.
    pub fn add_user(&mut self, user: User) {
        if self.users.is_empty() {
            self.host_id = Some(user.id.clone());
        }

        self.users.push(user);
    }

    /// Removes a user along with their skip vote, migrating the host role to
    /// the longest-present remaining user if the host is the one leaving.
    pub fn remove_user(&mut self, user_id: &str) {
        self.users.retain(|u| u.id != user_id);
        self.skip_votes.remove(user_id);

        if self.host_id.as_deref() == Some(user_id) {
            self.host_id = self.users.first().map(|u| u.id.clone());
        }
    }

    /// The current track position in seconds.
    pub fn position(&self, now: u64) -> f64 {
        match self.playback_state {
            PlaybackState::Playing => now.saturating_sub(self.started_at) as f64 / 1000.,
            PlaybackState::Paused => self.elapsed,
        }
    }

    fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    fn current_index_wire(&self) -> i64 {
        self.current_index.map(|i| i as i64).unwrap_or(-1)
    }

    /// Resumes playback. Returns false when there is nothing to resume.
    pub fn play(&mut self, now: u64) -> bool {
        if self.current_index.is_none() || self.playback_state == PlaybackState::Playing {
            return false;
        }

        self.started_at = now.saturating_sub((self.elapsed * 1000.) as u64);
        self.playback_state = PlaybackState::Playing;
        true
    }

    /// Pauses playback. Returns false when nothing is playing.
    pub fn pause(&mut self, now: u64) -> bool {
        if self.playback_state != PlaybackState::Playing {
            return false;
        }

        self.elapsed = now.saturating_sub(self.started_at) as f64 / 1000.;
        self.playback_state = PlaybackState::Paused;
        true
    }

    /// Moves the playhead. Returns false when there is no current track.
    pub fn seek(&mut self, time: f64, now: u64) -> bool {
        if self.current_index.is_none() {
            return false;
        }

        let time = time.max(0.);

        match self.playback_state {
            PlaybackState::Playing => self.started_at = now.saturating_sub((time * 1000.) as u64),
            PlaybackState::Paused => self.elapsed = time,
        }

        true
    }

    /// Starts the track at `index` from the beginning, clearing votes.
    fn start_track(&mut self, index: usize, now: u64) {
        self.current_index = Some(index);
        self.elapsed = 0.;
        self.started_at = now;
        self.playback_state = PlaybackState::Playing;
        self.skip_votes.clear();
    }

    /// Stops playback entirely, clearing votes.
    fn stop_all(&mut self) {
        self.current_index = None;
        self.playback_state = PlaybackState::Paused;
        self.elapsed = 0.;
        self.skip_votes.clear();
    }

    /// Appends a track. The first track to land in an idle room auto-plays.
    pub fn add_track(&mut self, track: Track, now: u64) {
        self.queue.push(track);

        if self.current_index.is_none() {
            self.start_track(0, now);
        }
    }

    /// Removes a track on behalf of `user_id`. Only the host and the user
    /// who added the track may remove it; everything else is a silent no-op.
    /// Returns true when the queue actually changed.
    pub fn remove_track(&mut self, user_id: &str, track_id: &str, now: u64) -> bool {
        let Some(index) = self.queue.iter().position(|t| t.id == track_id) else {
            return false;
        };

        let permitted =
            self.host_id.as_deref() == Some(user_id) || self.queue[index].added_by == user_id;

        if !permitted {
            return false;
        }

        self.queue.remove(index);

        if let Some(current) = self.current_index {
            if index < current {
                self.current_index = Some(current - 1);
            } else if index == current {
                if self.queue.is_empty() {
                    self.stop_all();
                } else {
                    // Either the next track slid into this slot, or the last
                    // track was removed and playback falls back to the new
                    // last one. It restarts from the beginning either way.
                    self.start_track(current.min(self.queue.len() - 1), now);
                }
            }
        }

        true
    }

    /// Registers a skip vote. Returns the updated tally, or `None` when
    /// nothing is playing. The caller advances the track once the tally
    /// meets the threshold.
    pub fn vote_skip(&mut self, user_id: &str) -> Option<(usize, usize)> {
        self.current_index?;

        self.skip_votes.insert(user_id.to_string());
        Some((self.skip_votes.len(), self.skip_needed()))
    }

    /// Votes needed for a skip to pass: a majority of present users.
    pub fn skip_needed(&self) -> usize {
        (self.users.len() + 1) / 2
    }

    /// Advances to the next track, or stops at the end of the queue.
    pub fn next_track(&mut self, now: u64) {
        self.skip_votes.clear();

        match self.current_index {
            Some(current) if current + 1 < self.queue.len() => self.start_track(current + 1, now),
            _ => self.stop_all(),
        }
    }

    /// Stores the crossfade duration, clamped to the supported range.
    pub fn set_crossfade(&mut self, duration: f64) -> f64 {
        self.crossfade_duration = duration.clamp(0., MAX_CROSSFADE);
        self.crossfade_duration
    }

    pub fn queue_message(&self) -> ServerMessage {
        ServerMessage::QueueUpdated {
            queue: self.queue.clone(),
            current_index: self.current_index_wire(),
        }
    }

    /// Builds a `playback:sync`, computing the live position at emit time.
    pub fn sync_message(&self, now: u64) -> ServerMessage {
        ServerMessage::PlaybackSync {
            state: self.playback_state,
            current_index: self.current_index_wire(),
            elapsed: self.position(now),
            timestamp: now,
            youtube_id: self.current_track().map(|t| t.youtube_id.clone()),
        }
    }

    pub fn serialize(&self, now: u64) -> SerializedRoom {
        SerializedRoom {
            id: self.id.clone(),
            name: self.name.clone(),
            host_id: self.host_id.clone(),
            queue: self.queue.clone(),
            current_index: self.current_index_wire(),
            playback_state: self.playback_state,
            elapsed: self.position(now),
            started_at: self.started_at,
            users: self.users.clone(),
            skip_votes: self.skip_votes.len(),
            skip_needed: self.skip_needed(),
            crossfade_duration: self.crossfade_duration,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const T0: u64 = 1_000_000;

    fn room() -> Room {
        Room::new("r1".to_string(), "Room r1".to_string(), T0)
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_string(),
            color: AVATAR_PALETTE[0].to_string(),
        }
    }

    fn track(id: &str, added_by: &str) -> Track {
        Track {
            id: id.to_string(),
            youtube_id: format!("ytid-{id}-ok!"),
            title: format!("Track {id}"),
            thumbnail: String::new(),
            duration: 0.,
            added_by: added_by.to_string(),
            added_by_name: added_by.to_string(),
        }
    }

    fn playing_room(track_ids: &[&str]) -> Room {
        let mut room = room();
        room.add_user(user("host"));

        for id in track_ids {
            room.add_track(track(id, "host"), T0);
        }

        room
    }

    #[test]
    fn test_first_track_auto_plays() {
        let mut room = playing_room(&[]);
        room.add_track(track("a", "host"), T0);

        assert_eq!(room.current_index, Some(0), "first track is scheduled");
        assert_eq!(room.playback_state, PlaybackState::Playing);
        assert_eq!(room.position(T0), 0., "playback starts from the beginning");

        room.add_track(track("b", "host"), T0 + 5_000);
        assert_eq!(room.current_index, Some(0), "later tracks only queue up");
    }

    #[test]
    fn test_pause_then_play_keeps_position() {
        let mut room = playing_room(&["a"]);

        assert!(room.pause(T0 + 30_000), "pause while playing succeeds");
        assert_eq!(room.elapsed, 30., "pause captures the position");

        // Ten seconds of silence do not move the playhead.
        assert_eq!(room.position(T0 + 40_000), 30.);

        assert!(room.play(T0 + 40_000), "play while paused succeeds");
        assert_eq!(room.position(T0 + 45_000), 35., "the clock resumes where it left off");
    }

    #[test]
    fn test_redundant_transitions_are_rejected() {
        let mut room = playing_room(&["a"]);
        let anchor = room.started_at;

        assert!(!room.play(T0 + 1_000), "play while playing is a no-op");
        assert_eq!(room.started_at, anchor, "the anchor is untouched");

        room.pause(T0 + 5_000);
        assert!(!room.pause(T0 + 9_000), "pause while paused is a no-op");
        assert_eq!(room.elapsed, 5., "the captured position is untouched");

        let mut idle = Room::new("r2".to_string(), "Room r2".to_string(), T0);
        assert!(!idle.play(T0), "play with nothing scheduled is a no-op");
        assert!(!idle.pause(T0), "pause with nothing scheduled is a no-op");
        assert!(!idle.seek(10., T0), "seek with nothing scheduled is a no-op");
    }

    #[test]
    fn test_seek() {
        let mut room = playing_room(&["a"]);

        assert!(room.seek(60., T0));
        assert_eq!(room.position(T0), 60., "seek while playing moves the anchor");

        room.pause(T0);
        assert!(room.seek(10., T0));
        assert_eq!(room.elapsed, 10., "seek while paused rewrites the position");

        assert!(room.seek(-5., T0));
        assert_eq!(room.elapsed, 0., "negative targets clamp to zero");
    }

    #[test]
    fn test_remove_track_before_current() {
        let mut room = playing_room(&["a", "b", "c"]);
        room.next_track(T0);
        room.seek(30., T0);

        assert!(room.remove_track("host", "a", T0 + 1_000));
        assert_eq!(room.current_index, Some(0), "the index shifts down");
        assert_eq!(room.position(T0), 30., "the clock is not reset");
        assert_eq!(room.current_track().unwrap().id, "b", "the same track keeps playing");
    }

    #[test]
    fn test_remove_current_non_last_track() {
        let mut room = playing_room(&["a", "b", "c"]);
        room.next_track(T0);
        room.vote_skip("host");

        assert!(room.remove_track("host", "b", T0 + 1_000));
        assert_eq!(room.current_index, Some(1), "the index stays put");
        assert_eq!(room.current_track().unwrap().id, "c", "the next track slides in");
        assert_eq!(room.position(T0 + 1_000), 0., "the slid-in track restarts");
        assert_eq!(room.playback_state, PlaybackState::Playing);
        assert!(room.skip_votes.is_empty(), "votes are cleared on track change");
    }

    #[test]
    fn test_remove_current_last_track() {
        let mut room = playing_room(&["a", "b"]);
        room.next_track(T0);

        assert!(room.remove_track("host", "b", T0 + 1_000));
        assert_eq!(room.current_index, Some(0), "playback falls back to the new last track");
        assert_eq!(room.current_track().unwrap().id, "a");
        assert_eq!(room.position(T0 + 1_000), 0., "the fallback track restarts");
    }

    #[test]
    fn test_remove_only_track_stops_playback() {
        let mut room = playing_room(&["a"]);

        assert!(room.remove_track("host", "a", T0));
        assert_eq!(room.current_index, None);
        assert_eq!(room.playback_state, PlaybackState::Paused);
        assert_eq!(room.elapsed, 0.);
    }

    #[test]
    fn test_remove_track_after_current() {
        let mut room = playing_room(&["a", "b"]);
        room.seek(30., T0);

        assert!(room.remove_track("host", "b", T0));
        assert_eq!(room.current_index, Some(0), "the index is untouched");
        assert_eq!(room.position(T0), 30., "the clock is untouched");
    }

    #[test]
    fn test_remove_track_permissions() {
        let mut room = playing_room(&["a"]);
        room.add_user(user("guest"));
        room.add_user(user("adder"));
        room.add_track(track("b", "adder"), T0);

        assert!(!room.remove_track("guest", "b", T0), "bystanders may not remove");
        assert_eq!(room.queue.len(), 2, "the queue is unchanged");

        assert!(room.remove_track("adder", "b", T0), "the adder may remove their own track");
        assert!(room.remove_track("host", "a", T0), "the host may remove anything");
        assert!(!room.remove_track("host", "nope", T0), "unknown tracks are a no-op");
    }

    #[test]
    fn test_skip_threshold_is_a_majority() {
        let mut room = room();

        for (count, needed) in [(1, 1), (2, 1), (3, 2), (4, 2)] {
            room.add_user(user(&format!("u{count}")));
            assert_eq!(room.skip_needed(), needed, "threshold for {count} users");
        }
    }

    #[test]
    fn test_vote_skip() {
        let mut room = playing_room(&["a", "b"]);
        room.add_user(user("guest"));
        room.add_user(user("other"));

        assert_eq!(room.vote_skip("guest"), Some((1, 2)), "one vote of two needed");
        assert_eq!(room.vote_skip("guest"), Some((1, 2)), "votes are not double counted");
        assert_eq!(room.vote_skip("host"), Some((2, 2)), "the threshold is reached");

        room.next_track(T0 + 1_000);
        assert_eq!(room.current_index, Some(1), "playback advances");
        assert!(room.skip_votes.is_empty());

        room.next_track(T0 + 2_000);
        assert_eq!(room.current_index, None, "the queue end stops playback");

        let mut idle = room_with_user();
        assert_eq!(idle.vote_skip("host"), None, "voting with nothing playing is a no-op");
    }

    fn room_with_user() -> Room {
        let mut room = room();
        room.add_user(user("host"));
        room
    }

    #[test]
    fn test_host_migration() {
        let mut room = room();
        room.add_user(user("u1"));
        room.add_user(user("u2"));
        room.add_user(user("u3"));
        assert_eq!(room.host_id(), Some("u1"), "the first user hosts");

        room.remove_user("u2");
        assert_eq!(room.host_id(), Some("u1"), "a guest leaving keeps the host");

        room.remove_user("u1");
        assert_eq!(room.host_id(), Some("u3"), "the host role migrates in join order");

        room.remove_user("u3");
        assert_eq!(room.host_id(), None, "an empty room has no host");
    }

    #[test]
    fn test_leaving_takes_votes_along() {
        let mut room = playing_room(&["a"]);
        room.add_user(user("guest"));
        room.vote_skip("guest");

        room.remove_user("guest");
        assert!(room.skip_votes.is_empty(), "a leaver takes their vote along");
    }

    #[test]
    fn test_crossfade_clamping() {
        let mut room = room();

        assert_eq!(room.set_crossfade(-1.), 0.);
        assert_eq!(room.set_crossfade(0.), 0.);
        assert_eq!(room.set_crossfade(3.7), 3.7);
        assert_eq!(room.set_crossfade(9.), 8., "values clamp to the maximum");
    }

    #[test]
    fn test_join_order_colors() {
        let mut room = room();

        assert_eq!(room.next_color(), AVATAR_PALETTE[0]);
        room.add_user(user("u1"));
        assert_eq!(room.next_color(), AVATAR_PALETTE[1]);

        for i in 2..=12 {
            room.add_user(user(&format!("u{i}")));
        }

        assert_eq!(room.next_color(), AVATAR_PALETTE[0], "the palette wraps around");
    }

    #[test]
    fn test_serialize_computes_live_position() {
        let mut room = playing_room(&["a"]);

        let snapshot = room.serialize(T0 + 10_000);
        assert_eq!(snapshot.elapsed, 10., "elapsed is computed at serialization time");
        assert_eq!(snapshot.started_at, T0);
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.skip_needed, 1);

        room.pause(T0 + 10_000);
        let snapshot = room.serialize(T0 + 60_000);
        assert_eq!(snapshot.elapsed, 10., "a paused room reports the frozen position");

        let idle = Room::new("r2".to_string(), "Room r2".to_string(), T0);
        let snapshot = idle.serialize(T0);
        assert_eq!(snapshot.current_index, -1, "an idle room reports -1");
        assert_eq!(snapshot.host_id, None);
    }
}
