//! The client's relay connection: a background task that performs the
//! registration handshake, then a `select!` loop forwarding outgoing
//! messages to the socket and incoming ones back to the main loop —
//! the same split the teacher's native WebSocket thread uses, adapted
//! from a JSON/WebSocket transport to the raw line-oriented TCP one.

use pinball_shared::protocol::{ClientMessage, RelayMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// A live (or recently-live) connection to the relay.
pub struct RelaySession {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
}

impl RelaySession {
    pub fn send(&self, message: ClientMessage) {
        let _ = self.outgoing.send(message);
    }
}

/// Connects to `host:port`, completes the registration handshake using
/// `board_name`, then spawns the background forwarding task. Incoming
/// `RelayMessage`s arrive on the returned receiver until the connection
/// drops, at which point the receiver simply closes — per the
/// peer/transport error policy, the caller is expected to carry on in
/// standalone mode rather than treat this as fatal.
pub async fn connect(host: &str, port: u16, board_name: &str) -> std::io::Result<(RelaySession, mpsc::UnboundedReceiver<RelayMessage>)> {
    let stream = TcpStream::connect((host, port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();

    // Registration handshake: the relay always asks first.
    if let Some(line) = reader.next_line().await? {
        if RelayMessage::parse(&line) != Ok(RelayMessage::GetClientBoardName) {
            tracing::warn!("relay sent an unexpected first line: {line:?}");
        }
    }
    write_half.write_all(format!("{board_name}\n").as_bytes()).await?;

    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<RelayMessage>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                outgoing = outgoing_rx.recv() => {
                    match outgoing {
                        Some(message) => {
                            let line = format!("{}\n", message.encode());
                            if write_half.write_all(line.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }

                line = reader.next_line() => {
                    match line {
                        Ok(Some(line)) => match RelayMessage::parse(&line) {
                            Ok(message) => {
                                if incoming_tx.send(message).is_err() {
                                    break;
                                }
                            }
                            Err(err) => tracing::warn!("malformed relay line {line:?}: {err}"),
                        },
                        Ok(None) | Err(_) => break,
                    }
                }
            }
        }
        tracing::info!("relay connection closed");
    });

    Ok((RelaySession { outgoing: outgoing_tx }, incoming_rx))
}
