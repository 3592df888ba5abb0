//! The relay operator's stdin console. Kept thin and separate from the
//! router core in `session`/`join`/`registry`: this module only parses
//! lines and calls into that core, the same way `client`'s board-file
//! parser and renderer sit outside `engine`.

use std::sync::Arc;

use pinball_shared::protocol::RelayMessage;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::session::Shared;

pub enum Command {
    JoinHorizontal { left: String, right: String },
    JoinVertical { top: String, bottom: String },
    Disconnect,
    Quit,
}

pub fn parse(line: &str) -> Option<Command> {
    let mut tokens = line.split_whitespace();
    match tokens.next()? {
        "h" => {
            let left = tokens.next()?.to_string();
            let right = tokens.next()?.to_string();
            Some(Command::JoinHorizontal { left, right })
        }
        "v" => {
            let top = tokens.next()?.to_string();
            let bottom = tokens.next()?.to_string();
            Some(Command::JoinVertical { top, bottom })
        }
        "disconnect" => Some(Command::Disconnect),
        "quit" => Some(Command::Quit),
        _ => None,
    }
}

/// Runs until stdin closes or a `quit` command is read.
pub async fn run(shared: Arc<Shared>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        let Some(command) = parse(&line) else {
            tracing::warn!("operator console: unrecognized command {line:?}");
            continue;
        };
        match command {
            Command::JoinHorizontal { left, right } => {
                let evictions = shared.joins.lock().await.join_horizontal(&left, &right);
                for eviction in evictions {
                    shared.registry.send_line(&eviction.recipient, eviction.message.encode()).await;
                }
                let message = RelayMessage::JoinHorizontal { left: left.clone(), right: right.clone() }.encode();
                shared.registry.send_line(&left, message.clone()).await;
                shared.registry.send_line(&right, message).await;
            }
            Command::JoinVertical { top, bottom } => {
                let evictions = shared.joins.lock().await.join_vertical(&top, &bottom);
                for eviction in evictions {
                    shared.registry.send_line(&eviction.recipient, eviction.message.encode()).await;
                }
                let message = RelayMessage::JoinVertical { top: top.clone(), bottom: bottom.clone() }.encode();
                shared.registry.send_line(&top, message.clone()).await;
                shared.registry.send_line(&bottom, message).await;
            }
            Command::Disconnect => {
                shared.registry.close_all().await;
            }
            Command::Quit => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_horizontal_join() {
        match parse("h A B") {
            Some(Command::JoinHorizontal { left, right }) => {
                assert_eq!(left, "A");
                assert_eq!(right, "B");
            }
            _ => panic!("expected JoinHorizontal"),
        }
    }

    #[test]
    fn rejects_join_missing_an_argument() {
        assert!(parse("h A").is_none());
    }

    #[test]
    fn recognizes_disconnect_and_quit() {
        assert!(matches!(parse("disconnect"), Some(Command::Disconnect)));
        assert!(matches!(parse("quit"), Some(Command::Quit)));
    }

    #[test]
    fn unknown_command_is_none() {
        assert!(parse("frobnicate").is_none());
    }
}
