//! Per-connection handling: registration handshake, then a forwarding
//! loop that turns `ClientMessage`s into routed or broadcast
//! `RelayMessage`s. One task reads the socket, a second owns the write
//! half and drains an mpsc channel fed by the reader and by anyone else
//! (the operator loop, other sessions) who wants to talk to this board.

use std::sync::Arc;

use pinball_shared::protocol::{ClientMessage, RelayMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::join::JoinTable;
use crate::registry::{ConnectionRegistry, WriterMsg};

pub struct Shared {
    pub registry: ConnectionRegistry,
    pub joins: tokio::sync::Mutex<JoinTable>,
}

impl Shared {
    pub fn new() -> Arc<Shared> {
        Arc::new(Shared { registry: ConnectionRegistry::new(), joins: tokio::sync::Mutex::new(JoinTable::new()) })
    }
}

async fn writer_task(mut write_half: tokio::net::tcp::OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<WriterMsg>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            WriterMsg::Line(line) => {
                if write_half.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                    break;
                }
            }
            WriterMsg::Close => break,
        }
    }
    let _ = write_half.shutdown().await;
}

/// Drives one client connection from accept to disconnect. Never returns
/// an error: transport failures just end the session.
pub async fn handle_connection(socket: TcpStream, shared: Arc<Shared>) {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half).lines();

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(writer_task(write_half, rx));

    if tx.send(WriterMsg::Line(RelayMessage::GetClientBoardName.encode())).is_err() {
        return;
    }

    let board_name = match reader.next_line().await {
        Ok(Some(line)) => match ClientMessage::parse(&line) {
            Ok(ClientMessage::BoardName(name)) if !name.is_empty() => name,
            _ => {
                tracing::warn!("registration line was not a bare board name: {line:?}");
                let _ = tx.send(WriterMsg::Close);
                let _ = writer.await;
                return;
            }
        },
        _ => {
            let _ = writer.await;
            return;
        }
    };

    if shared.registry.register(board_name.clone(), tx.clone()).await.is_err() {
        tracing::warn!("rejected duplicate board name {board_name:?}");
        let _ = tx.send(WriterMsg::Line(RelayMessage::Failure.encode()));
        let _ = tx.send(WriterMsg::Close);
        let _ = writer.await;
        return;
    }
    tracing::info!("board {board_name:?} connected");
    broadcast_roster(&shared).await;

    loop {
        let line = match reader.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        match ClientMessage::parse(&line) {
            Ok(ClientMessage::Quit) => break,
            Ok(ClientMessage::BoardName(_)) => {
                tracing::warn!("{board_name}: ignoring unexpected re-registration line");
            }
            Ok(ClientMessage::TeleportPortal { dest_board, ball_name, velocity, portal_name }) => {
                let forwarded = RelayMessage::TeleportPortal { dest_board: dest_board.clone(), ball_name, velocity, portal_name };
                route(&shared, &board_name, &dest_board, forwarded).await;
            }
            Ok(ClientMessage::TeleportWall { dest_board, ball_name, velocity, position, wall }) => {
                let forwarded = RelayMessage::TeleportWall { dest_board: dest_board.clone(), ball_name, velocity, position, wall };
                route(&shared, &board_name, &dest_board, forwarded).await;
            }
            Ok(ClientMessage::ConnectPortal { portal_name }) => {
                let forwarded = RelayMessage::ConnectPortal { portal_name };
                shared.registry.broadcast_line(forwarded.encode(), Some(&board_name)).await;
            }
            Ok(ClientMessage::DisconnectPortal { portal_name }) => {
                let forwarded = RelayMessage::DisconnectPortal { portal_name };
                shared.registry.broadcast_line(forwarded.encode(), Some(&board_name)).await;
            }
            Err(err) => {
                tracing::warn!("{board_name}: malformed line {line:?}: {err}");
            }
        }
    }

    shared.registry.remove(&board_name).await;
    let evictions = shared.joins.lock().await.disconnect_board(&board_name);
    for eviction in evictions {
        shared.registry.send_line(&eviction.recipient, eviction.message.encode()).await;
    }
    tracing::info!("board {board_name:?} disconnected");
    broadcast_roster(&shared).await;
    let _ = writer.await;
}

async fn route(shared: &Shared, sender: &str, dest: &str, message: RelayMessage) {
    if !shared.registry.send_line(dest, message.encode()).await {
        tracing::warn!("{sender}: destination board {dest:?} is not connected");
        shared.registry.send_line(sender, RelayMessage::Failure.encode()).await;
    }
}

async fn broadcast_roster(shared: &Shared) {
    let names = shared.registry.all_names().await;
    shared.registry.broadcast_line(RelayMessage::AllConnectedBoards(names).encode(), None).await;
}
