//! Server network layer: WebSocket accept loop and per-connection tasks
//!
//! Connection tasks never touch authoritative state. Every inbound frame
//! becomes a [`NetworkEvent`] in the game loop's mailbox; outbound frames
//! travel the opposite way through each session's unbounded channel, which
//! a writer task drains into the socket sink.
//!
//! Per connection the protocol is a three-state machine:
//! Idle -> (join) -> Joined -> (close/error) -> Terminated. Input frames
//! while Idle are dropped silently; malformed frames are logged and the
//! connection stays open; termination is idempotent because registry
//! lookup misses are no-ops.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::protocol::{ClientMessage, InputCommand, DEFAULT_NAME, DEFAULT_ROOM};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Events sent from connection tasks to the game loop.
#[derive(Debug)]
pub enum NetworkEvent {
    Join {
        match_id: String,
        name: String,
        sender: mpsc::UnboundedSender<Message>,
        /// Carries the freshly generated session id back to the
        /// connection so it can route subsequent inputs.
        reply: oneshot::Sender<String>,
    },
    Input {
        match_id: String,
        session_id: String,
        command: InputCommand,
    },
    Leave {
        match_id: String,
        session_id: String,
    },
}

/// Session identity for one joined connection.
struct ConnContext {
    match_id: String,
    session_id: String,
}

/// Accepts connections forever, one task per socket.
pub async fn run_listener(listener: TcpListener, events: mpsc::UnboundedSender<NetworkEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let events = events.clone();
                tokio::spawn(handle_connection(stream, addr, events));
            }
            Err(e) => {
                error!("accept failed: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<NetworkEvent>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Connection from {}", addr);

    let (mut write, mut read) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if write.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut context: Option<ConnContext> = None;

    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("socket error from {}: {}", addr, e);
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings are answered by the protocol layer; nothing else
            // carries game messages.
            _ => continue,
        };

        let message = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("malformed message from {}: {}", addr, e);
                continue;
            }
        };

        match message {
            ClientMessage::Join { match_id, name } => {
                if context.is_some() {
                    warn!("{} sent join while already joined, ignoring", addr);
                    continue;
                }

                let match_id = match_id.unwrap_or_else(|| DEFAULT_ROOM.to_string());
                let name = name.unwrap_or_else(|| DEFAULT_NAME.to_string());
                let (reply_tx, reply_rx) = oneshot::channel();

                let event = NetworkEvent::Join {
                    match_id: match_id.clone(),
                    name,
                    sender: out_tx.clone(),
                    reply: reply_tx,
                };
                if events.send(event).is_err() {
                    break;
                }

                // Waiting here serializes join against any input frames
                // the client pipelined behind it.
                match reply_rx.await {
                    Ok(session_id) => {
                        context = Some(ConnContext {
                            match_id,
                            session_id,
                        })
                    }
                    Err(_) => break,
                }
            }

            ClientMessage::Input { seq, dt, input, .. } => match &context {
                // The connection context, not the wire field, decides
                // which session the input belongs to.
                Some(ctx) => {
                    let event = NetworkEvent::Input {
                        match_id: ctx.match_id.clone(),
                        session_id: ctx.session_id.clone(),
                        command: InputCommand { seq, dt, input },
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                None => debug!("input from {} before join, dropped", addr),
            },
        }
    }

    if let Some(ctx) = context {
        let _ = events.send(NetworkEvent::Leave {
            match_id: ctx.match_id,
            session_id: ctx.session_id,
        });
    }
    writer.abort();
    info!("Connection from {} closed", addr);
}
