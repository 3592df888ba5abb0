//! Integration tests for the relay. These bind a real `TcpListener` on an
//! ephemeral port, drive the accept loop and operator console directly
//! (bypassing stdin), and talk the wire protocol over real sockets.

use std::sync::Arc;
use std::time::Duration;

use pinball_relay::session::{handle_connection, Shared};
use pinball_shared::protocol::{ClientMessage, RelayMessage, Wall};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Starts a relay accept loop on an ephemeral port and returns its address
/// plus the shared state (so tests can drive operator commands directly).
async fn start_relay() -> (std::net::SocketAddr, Arc<Shared>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shared = Shared::new();
    let accept_shared = shared.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = listener.accept().await.unwrap();
            let shared = accept_shared.clone();
            tokio::spawn(async move { handle_connection(socket, shared).await });
        }
    });
    (addr, shared)
}

struct Client {
    reader: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr, board_name: &str) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half).lines();
        // First line from the relay must be the registration request.
        let line = reader.next_line().await.unwrap().unwrap();
        assert_eq!(RelayMessage::parse(&line).unwrap(), RelayMessage::GetClientBoardName);
        write_half.write_all(format!("{board_name}\n").as_bytes()).await.unwrap();
        Client { reader, writer: write_half }
    }

    async fn send(&mut self, message: &ClientMessage) {
        self.writer.write_all(format!("{}\n", message.encode()).as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> RelayMessage {
        let line = tokio::time::timeout(Duration::from_secs(2), self.reader.next_line())
            .await
            .expect("timed out waiting for a relay message")
            .unwrap()
            .unwrap();
        RelayMessage::parse(&line).unwrap()
    }

    /// Drains messages until one matching `pred` arrives, or times out.
    async fn recv_until(&mut self, pred: impl Fn(&RelayMessage) -> bool) -> RelayMessage {
        for _ in 0..10 {
            let message = self.recv().await;
            if pred(&message) {
                return message;
            }
        }
        panic!("did not see the expected message within 10 lines");
    }
}

#[tokio::test]
async fn registering_two_boards_broadcasts_the_roster() {
    let (addr, _shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let roster = a.recv().await;
    assert_eq!(roster, RelayMessage::AllConnectedBoards(vec!["A".to_string()]));

    let _b = Client::connect(addr, "B").await;
    let updated = a.recv_until(|m| matches!(m, RelayMessage::AllConnectedBoards(names) if names.len() == 2)).await;
    match updated {
        RelayMessage::AllConnectedBoards(names) => {
            assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn duplicate_board_name_is_rejected_with_failure() {
    let (addr, _shared) = start_relay().await;
    let _a = Client::connect(addr, "A").await;
    let mut dupe = Client::connect(addr, "A").await;
    assert_eq!(dupe.recv().await, RelayMessage::Failure);
}

#[tokio::test]
async fn teleport_wall_is_routed_to_the_named_destination() {
    let (addr, _shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let _ = a.recv().await; // roster after A registers
    let mut b = Client::connect(addr, "B").await;
    let _ = a.recv().await; // roster update once B registers
    let _ = b.recv().await; // roster sent to B on registration

    a.send(&ClientMessage::TeleportWall {
        dest_board: "B".to_string(),
        ball_name: "ball1".to_string(),
        velocity: pinball_shared::geometry::Vector2::new(1.0, 2.0),
        position: pinball_shared::geometry::Vector2::new(19.9, 5.0),
        wall: Wall::Right,
    })
    .await;

    let received = b.recv().await;
    match received {
        RelayMessage::TeleportWall { dest_board, ball_name, wall, .. } => {
            assert_eq!(dest_board, "B");
            assert_eq!(ball_name, "ball1");
            assert_eq!(wall, Wall::Right);
        }
        other => panic!("expected TeleportWall, got {other:?}"),
    }
}

#[tokio::test]
async fn teleport_to_an_unknown_board_returns_failure_to_the_sender() {
    let (addr, _shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let _ = a.recv().await;

    a.send(&ClientMessage::TeleportPortal {
        dest_board: "Ghost".to_string(),
        ball_name: "ball1".to_string(),
        velocity: pinball_shared::geometry::Vector2::new(0.0, 0.0),
        portal_name: "p1".to_string(),
    })
    .await;

    assert_eq!(a.recv().await, RelayMessage::Failure);
}

#[tokio::test]
async fn operator_join_horizontal_notifies_both_boards() {
    let (addr, shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let _ = a.recv().await;
    let mut b = Client::connect(addr, "B").await;
    let _ = a.recv().await;
    let _ = b.recv().await;

    let evictions = shared.joins.lock().await.join_horizontal("A", "B");
    assert!(evictions.is_empty());
    let message = RelayMessage::JoinHorizontal { left: "A".to_string(), right: "B".to_string() };
    shared.registry.send_line("A", message.encode()).await;
    shared.registry.send_line("B", message.encode()).await;

    assert_eq!(a.recv().await, RelayMessage::JoinHorizontal { left: "A".to_string(), right: "B".to_string() });
    assert_eq!(b.recv().await, RelayMessage::JoinHorizontal { left: "A".to_string(), right: "B".to_string() });
}

#[tokio::test]
async fn disconnecting_a_board_evicts_its_wall_join() {
    let (addr, shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let _ = a.recv().await;
    let b = Client::connect(addr, "B").await;
    let _ = a.recv().await;

    shared.joins.lock().await.join_horizontal("A", "B");
    drop(b); // closes B's socket, ending its session

    let eviction = a.recv_until(|m| matches!(m, RelayMessage::DisconnectWall { .. })).await;
    match eviction {
        RelayMessage::DisconnectWall { board_name, wall } => {
            assert_eq!(board_name, "B");
            assert_eq!(wall, Wall::Left);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn connect_portal_is_broadcast_to_other_boards() {
    let (addr, _shared) = start_relay().await;
    let mut a = Client::connect(addr, "A").await;
    let _ = a.recv().await;
    let mut b = Client::connect(addr, "B").await;
    let _ = a.recv().await;
    let _ = b.recv().await;

    a.send(&ClientMessage::ConnectPortal { portal_name: "p1".to_string() }).await;
    assert_eq!(b.recv().await, RelayMessage::ConnectPortal { portal_name: "p1".to_string() });
}
