use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use jam_engine::{parse_client_message, youtube, ClientMessage, Session};
use log::debug;

use crate::context::ServerContext;

pub async fn websocket_handler(context: ServerContext, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, context))
}

/// Pumps one participant connection: outbound frames from the session's
/// queue are written to the socket, inbound frames are decoded and handed to
/// the coordinator. Undecodable frames are dropped without a reply.
async fn handle_socket(mut socket: WebSocket, context: ServerContext) {
    let (session, outgoing) = Session::new();

    debug!("WebSocket connected: session={}", session.id());

    loop {
        tokio::select! {
            frame = outgoing.recv_async() => {
                let Ok(frame) = frame else {
                    break;
                };

                if socket.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            message = socket.recv() => {
                let message = match message {
                    Some(Ok(message)) => message,
                    _ => break,
                };

                match message {
                    Message::Text(text) => {
                        let Some(parsed) = parse_client_message(&text) else {
                            continue;
                        };

                        handle_message(&context, &session, parsed).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    context.rooms.disconnect(&session);

    debug!("WebSocket closed: session={}", session.id());
}

async fn handle_message(context: &ServerContext, session: &Arc<Session>, message: ClientMessage) {
    match message {
        // Resolving metadata is an outbound HTTP call, so it happens here
        // rather than in the engine. The sender must already be in a room,
        // checked before spending anything on the fetch.
        ClientMessage::QueueAdd { url } => {
            if context.rooms.user_of(session).is_none() {
                return;
            }

            match youtube::resolve(&url).await {
                Some(video) => context.rooms.add_track(session, video),
                None => context.rooms.send_error(session, "Invalid YouTube URL"),
            }
        }
        other => context.rooms.handle_message(session, other),
    }
}
