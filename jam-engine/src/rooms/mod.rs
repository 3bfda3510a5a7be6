mod room;

use std::sync::Arc;

use dashmap::DashMap;
use log::{info, warn};
use parking_lot::Mutex;
use serde_json::Value;

pub use room::*;

use crate::{
    clock::Clock,
    protocol::{coerce_number, coerce_text, ClientMessage, ServerMessage, Track, User},
    session::{Session, SessionId},
    util::{clean_name, random_id, ROOM_ID_LENGTH, TRACK_ID_LENGTH, USER_ID_LENGTH},
    youtube::ResolvedVideo,
};

const MAX_ROOM_NAME: usize = 64;
const MAX_USER_NAME: usize = 24;
const MAX_CHAT_LENGTH: usize = 500;

/// The top-level coordinator, owning every room and the two session indices.
///
/// Rooms are only ever mutated under their own lock, and registry guards are
/// never held across one, so one room's traffic cannot stall another's.
/// Broadcasts happen after the room lock is released.
pub struct RoomManager {
    clock: Arc<dyn Clock>,

    rooms: DashMap<String, Arc<Mutex<Room>>>,
    /// user id → session and room membership
    connections: DashMap<String, Connection>,
    /// session id → user id, populated on join
    session_users: DashMap<SessionId, String>,
}

#[derive(Clone)]
struct Connection {
    session: Arc<Session>,
    room_id: String,
}

/// A read-only room summary for the HTTP surface.
#[derive(Debug, Clone)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub user_count: usize,
}

impl RoomManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rooms: Default::default(),
            connections: Default::default(),
            session_users: Default::default(),
        }
    }

    /// Creates an empty room, defaulting the name when it is blank.
    pub fn create_room(&self, name: Option<String>) -> RoomSummary {
        let id = loop {
            let id = random_id(ROOM_ID_LENGTH);

            if !self.rooms.contains_key(&id) {
                break id;
            }
        };

        let name = match clean_name(name.as_deref().unwrap_or_default(), MAX_ROOM_NAME) {
            cleaned if cleaned.is_empty() => format!("Room {id}"),
            cleaned => cleaned,
        };

        let room = Room::new(id.clone(), name.clone(), self.clock.now_ms());
        self.rooms.insert(id.clone(), Arc::new(Mutex::new(room)));

        info!("Room {} ({}) created", id, name);

        RoomSummary {
            id,
            name,
            user_count: 0,
        }
    }

    /// Returns a room summary if the room exists.
    pub fn room_summary(&self, room_id: &str) -> Option<RoomSummary> {
        let room = self.room_by_id(room_id)?;
        let room = room.lock();

        Some(RoomSummary {
            id: room.id.clone(),
            name: room.name.clone(),
            user_count: room.user_count(),
        })
    }

    /// Summaries for every live room.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms: Vec<_> = self.rooms.iter().map(|r| r.clone()).collect();

        rooms
            .iter()
            .map(|room| {
                let room = room.lock();

                RoomSummary {
                    id: room.id.clone(),
                    name: room.name.clone(),
                    user_count: room.user_count(),
                }
            })
            .collect()
    }

    /// Returns the user bound to a session, if it has joined a room.
    pub fn user_of(&self, session: &Session) -> Option<String> {
        self.session_users.get(&session.id()).map(|u| u.clone())
    }

    /// Routes one decoded inbound message. Messages other than `join` from a
    /// session that has not joined are dropped without a reply.
    pub fn handle_message(&self, session: &Arc<Session>, message: ClientMessage) {
        match message {
            ClientMessage::Join { room_id, user_name } => self.join(session, &room_id, &user_name),
            // Resolving a url needs outbound HTTP, which the engine never
            // performs. The transport resolves it and calls `add_track`.
            ClientMessage::QueueAdd { .. } => {}
            other => {
                let Some(user_id) = self.user_of(session) else {
                    return;
                };

                match other {
                    ClientMessage::QueueRemove { track_id } => {
                        self.remove_track(&user_id, &track_id)
                    }
                    ClientMessage::Play => self.play(&user_id),
                    ClientMessage::Pause => self.pause(&user_id),
                    ClientMessage::Skip => self.vote_skip(&user_id),
                    ClientMessage::Seek { time } => self.seek(&user_id, &time),
                    ClientMessage::Chat { text } => self.chat(&user_id, &text),
                    ClientMessage::CrossfadeSet { duration } => {
                        self.set_crossfade(&user_id, &duration)
                    }
                    _ => {}
                }
            }
        }
    }

    /// Tears down whatever user is bound to the session. A session that
    /// never joined is simply discarded.
    pub fn disconnect(&self, session: &Session) {
        let Some(user_id) = self.user_of(session) else {
            return;
        };

        self.leave(&user_id);
    }

    /// Appends an already-resolved track on behalf of the session's user.
    pub fn add_track(&self, session: &Arc<Session>, video: ResolvedVideo) {
        let Some(user_id) = self.user_of(session) else {
            return;
        };

        let Some(room) = self.room_of(&user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let (messages, user_ids) = {
            let mut room = room.lock();

            let track = Track {
                id: random_id(TRACK_ID_LENGTH),
                youtube_id: video.youtube_id,
                title: video.title,
                thumbnail: video.thumbnail,
                duration: 0.,
                added_by: user_id.clone(),
                added_by_name: room.user_name(&user_id).unwrap_or("Anonymous").to_string(),
            };

            room.add_track(track, now);

            (
                [room.queue_message(), room.sync_message(now)],
                room.user_ids(),
            )
        };

        for message in &messages {
            self.broadcast(&user_ids, message, None);
        }
    }

    /// Sends an in-band error to one session only.
    pub fn send_error(&self, session: &Session, message: &str) {
        let delivered = self.send_to(
            session,
            &ServerMessage::RoomError {
                message: message.to_string(),
            },
        );

        if !delivered {
            if let Some(user_id) = self.user_of(session) {
                self.leave(&user_id);
            }
        }
    }

    fn join(&self, session: &Arc<Session>, room_id: &str, user_name: &str) {
        // A session is bound to at most one user.
        if self.session_users.contains_key(&session.id()) {
            return;
        }

        let Some(room) = self.room_by_id(room_id) else {
            self.send_to(
                session,
                &ServerMessage::RoomError {
                    message: "Room not found".to_string(),
                },
            );
            return;
        };

        let now = self.clock.now_ms();
        let user_id = random_id(USER_ID_LENGTH);

        let name = match clean_name(user_name, MAX_USER_NAME) {
            cleaned if cleaned.is_empty() => "Anonymous".to_string(),
            cleaned => cleaned,
        };

        let (state, joined, user_ids) = {
            let mut room = room.lock();

            let user = User {
                id: user_id.clone(),
                name,
                color: room.next_color().to_string(),
            };

            room.add_user(user.clone());

            (
                ServerMessage::RoomState {
                    room: room.serialize(now),
                    user_id: user_id.clone(),
                },
                ServerMessage::UserJoined { user },
                room.user_ids(),
            )
        };

        self.connections.insert(
            user_id.clone(),
            Connection {
                session: session.clone(),
                room_id: room_id.to_string(),
            },
        );
        self.session_users.insert(session.id(), user_id.clone());

        info!("User {} joined room {}", user_id, room_id);

        // The joiner gets the full snapshot before anyone hears about them.
        if !self.send_to(session, &state) {
            self.leave(&user_id);
            return;
        }

        self.broadcast(&user_ids, &joined, Some(&user_id));
    }

    fn leave(&self, user_id: &str) {
        let Some((_, connection)) = self.connections.remove(user_id) else {
            return;
        };

        self.session_users.remove(&connection.session.id());
        connection.session.close();

        let Some(room) = self.room_by_id(&connection.room_id) else {
            return;
        };

        let (user_ids, destroy) = {
            let mut room = room.lock();
            room.remove_user(user_id);

            (room.user_ids(), room.user_count() == 0)
        };

        info!("User {} left room {}", user_id, connection.room_id);

        self.broadcast(
            &user_ids,
            &ServerMessage::UserLeft {
                user_id: user_id.to_string(),
            },
            None,
        );

        if destroy {
            // A join may have raced in after the room lock was released, so
            // emptiness is re-checked under the registry lock before removal.
            let removed = self
                .rooms
                .remove_if(&connection.room_id, |_, room| room.lock().user_count() == 0);

            if removed.is_some() {
                info!("Room {} is empty and was removed", connection.room_id);
            }
        }
    }

    fn play(&self, user_id: &str) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let update = {
            let mut room = room.lock();
            room.play(now)
                .then(|| (room.sync_message(now), room.user_ids()))
        };

        if let Some((message, user_ids)) = update {
            self.broadcast(&user_ids, &message, None);
        }
    }

    fn pause(&self, user_id: &str) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let update = {
            let mut room = room.lock();
            room.pause(now)
                .then(|| (room.sync_message(now), room.user_ids()))
        };

        if let Some((message, user_ids)) = update {
            self.broadcast(&user_ids, &message, None);
        }
    }

    fn seek(&self, user_id: &str, time: &Value) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();
        let time = coerce_number(time);

        let update = {
            let mut room = room.lock();
            room.seek(time, now)
                .then(|| (room.sync_message(now), room.user_ids()))
        };

        if let Some((message, user_ids)) = update {
            self.broadcast(&user_ids, &message, None);
        }
    }

    fn vote_skip(&self, user_id: &str) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let (messages, user_ids) = {
            let mut room = room.lock();

            let Some((current, needed)) = room.vote_skip(user_id) else {
                return;
            };

            let mut messages = vec![ServerMessage::SkipVotes { current, needed }];

            if current >= needed {
                room.next_track(now);
                messages.push(room.queue_message());
                messages.push(room.sync_message(now));
            }

            (messages, room.user_ids())
        };

        for message in &messages {
            self.broadcast(&user_ids, message, None);
        }
    }

    fn remove_track(&self, user_id: &str, track_id: &str) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let update = {
            let mut room = room.lock();
            room.remove_track(user_id, track_id, now)
                .then(|| ([room.queue_message(), room.sync_message(now)], room.user_ids()))
        };

        if let Some((messages, user_ids)) = update {
            for message in &messages {
                self.broadcast(&user_ids, message, None);
            }
        }
    }

    fn chat(&self, user_id: &str, text: &Value) {
        let text: String = coerce_text(text).trim().chars().take(MAX_CHAT_LENGTH).collect();

        if text.is_empty() {
            return;
        }

        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let now = self.clock.now_ms();

        let (message, user_ids) = {
            let room = room.lock();

            let message = ServerMessage::Chat {
                user_id: user_id.to_string(),
                user_name: room.user_name(user_id).unwrap_or("Anonymous").to_string(),
                text,
                timestamp: now,
            };

            (message, room.user_ids())
        };

        self.broadcast(&user_ids, &message, None);
    }

    fn set_crossfade(&self, user_id: &str, duration: &Value) {
        let Some(room) = self.room_of(user_id) else {
            return;
        };

        let (message, user_ids) = {
            let mut room = room.lock();
            let duration = room.set_crossfade(coerce_number(duration));

            (ServerMessage::CrossfadeUpdated { duration }, room.user_ids())
        };

        self.broadcast(&user_ids, &message, None);
    }

    fn room_by_id(&self, room_id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms.get(room_id).map(|r| r.clone())
    }

    fn room_of(&self, user_id: &str) -> Option<Arc<Mutex<Room>>> {
        let room_id = self.connections.get(user_id).map(|c| c.room_id.clone())?;
        self.room_by_id(&room_id)
    }

    /// Delivers a message to every given user, optionally excluding one.
    /// A failed delivery never aborts the fan-out; the users in question are
    /// evicted once it finishes.
    fn broadcast(&self, user_ids: &[String], message: &ServerMessage, exclude: Option<&str>) {
        let frame = serde_json::to_string(message).expect("message serializes");

        let mut failed = Vec::new();

        for user_id in user_ids {
            if Some(user_id.as_str()) == exclude {
                continue;
            }

            let Some(session) = self.connections.get(user_id).map(|c| c.session.clone()) else {
                continue;
            };

            if !session.deliver(frame.clone()) {
                failed.push(user_id.clone());
            }
        }

        for user_id in failed {
            warn!("Evicting user {} after a failed delivery", user_id);
            self.leave(&user_id);
        }
    }

    fn send_to(&self, session: &Session, message: &ServerMessage) -> bool {
        let frame = serde_json::to_string(message).expect("message serializes");
        session.deliver(frame)
    }
}
