//! Client connection to the movement server
//!
//! A reader task parses inbound frames into a queue that the update loop
//! drains at the start of each frame, so a snapshot is never applied in
//! the middle of a simulation step. Sends are plain JSON text frames.

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use shared::protocol::{ClientMessage, InputCommand, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

pub struct Connection {
    write: WsSink,
    incoming: mpsc::UnboundedReceiver<ServerMessage>,
    closed: bool,
}

impl Connection {
    /// Opens the WebSocket and spawns the reader task.
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (ws, _) = connect_async(url).await?;
        let (write, mut read) = ws.split();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        debug!("socket error: {}", e);
                        break;
                    }
                };

                let text = match frame {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };

                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => {
                        if incoming_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("malformed server message: {}", e),
                }
            }
            // Dropping the sender is what surfaces the disconnect.
        });

        Ok(Connection {
            write,
            incoming: incoming_rx,
            closed: false,
        })
    }

    /// Next queued server message, if any. Marks the connection closed
    /// once the reader task has gone away.
    pub fn poll_message(&mut self) -> Option<ServerMessage> {
        match self.incoming.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn send_join(
        &mut self,
        match_id: &str,
        name: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientMessage::Join {
            match_id: Some(match_id.to_string()),
            name: Some(name.to_string()),
        })
        .await
    }

    pub async fn send_input(
        &mut self,
        match_id: &str,
        command: &InputCommand,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientMessage::Input {
            match_id: match_id.to_string(),
            seq: command.seq,
            dt: command.dt,
            input: command.input,
        })
        .await
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), Box<dyn std::error::Error>> {
        let text = serde_json::to_string(message)?;
        self.write.send(Message::Text(text)).await?;
        Ok(())
    }
}
