//! The board-linking wire protocol: a line-oriented, `\n`-terminated ASCII
//! grammar exchanged between boards and the relay. Unlike the teacher's
//! JSON-over-WebSocket protocol, every message here is a single line of
//! whitespace-separated tokens — there is no serde involved, by design,
//! since the wire format the spec defines simply isn't JSON.

use std::fmt;
use thiserror::Error;

use crate::geometry::Vector2;

/// One of the four walls of a board, or — for join bookkeeping — the side a
/// neighbour occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    /// The wall a ball crossing this one would arrive at on the neighbour
    /// board — lifted out as a compile-time table per the design notes
    /// rather than computed with a match buried in the simulator.
    pub const fn opposite(self) -> Wall {
        match self {
            Wall::Left => Wall::Right,
            Wall::Right => Wall::Left,
            Wall::Top => Wall::Bottom,
            Wall::Bottom => Wall::Top,
        }
    }

    pub const ALL: [Wall; 4] = [Wall::Left, Wall::Right, Wall::Top, Wall::Bottom];

    pub fn as_str(self) -> &'static str {
        match self {
            Wall::Left => "left",
            Wall::Right => "right",
            Wall::Top => "top",
            Wall::Bottom => "bottom",
        }
    }

    pub fn parse(token: &str) -> Option<Wall> {
        match token {
            "left" => Some(Wall::Left),
            "right" => Some(Wall::Right),
            "top" => Some(Wall::Top),
            "bottom" => Some(Wall::Bottom),
            _ => None,
        }
    }
}

impl fmt::Display for Wall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty line")]
    EmptyLine,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("malformed message: {0}")]
    Malformed(String),
}

fn parse_f64(token: Option<&str>, what: &str) -> Result<f64, ProtocolError> {
    token
        .ok_or_else(|| ProtocolError::Malformed(format!("missing {what}")))?
        .parse::<f64>()
        .map_err(|_| ProtocolError::Malformed(format!("bad {what}")))
}

fn parse_wall(token: Option<&str>) -> Result<Wall, ProtocolError> {
    let token = token.ok_or_else(|| ProtocolError::Malformed("missing wall".into()))?;
    Wall::parse(token).ok_or_else(|| ProtocolError::Malformed(format!("bad wall {token:?}")))
}

fn next<'a>(token: Option<&'a str>, what: &str) -> Result<&'a str, ProtocolError> {
    token.ok_or_else(|| ProtocolError::Malformed(format!("missing {what}")))
}

/// A message a client sends upstream to the relay.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    /// Reply to `getClientBoardName`; just the bare board name.
    BoardName(String),
    TeleportPortal {
        dest_board: String,
        ball_name: String,
        velocity: Vector2,
        portal_name: String,
    },
    TeleportWall {
        dest_board: String,
        ball_name: String,
        velocity: Vector2,
        position: Vector2,
        wall: Wall,
    },
    ConnectPortal { portal_name: String },
    DisconnectPortal { portal_name: String },
    Quit,
}

impl ClientMessage {
    pub fn parse(line: &str) -> Result<ClientMessage, ProtocolError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }
        let mut tokens = line.split_whitespace();
        let head = next(tokens.next(), "command")?;
        match head {
            "quit" => Ok(ClientMessage::Quit),
            "teleportPortal=" => Ok(ClientMessage::TeleportPortal {
                dest_board: next(tokens.next(), "destBoard")?.to_string(),
                ball_name: next(tokens.next(), "ballName")?.to_string(),
                velocity: Vector2::new(
                    parse_f64(tokens.next(), "vx")?,
                    parse_f64(tokens.next(), "vy")?,
                ),
                portal_name: next(tokens.next(), "portalName")?.to_string(),
            }),
            "teleportWall=" => {
                let dest_board = next(tokens.next(), "destBoard")?.to_string();
                let ball_name = next(tokens.next(), "ballName")?.to_string();
                let vx = parse_f64(tokens.next(), "vx")?;
                let vy = parse_f64(tokens.next(), "vy")?;
                let x = parse_f64(tokens.next(), "x")?;
                let y = parse_f64(tokens.next(), "y")?;
                let wall = parse_wall(tokens.next())?;
                Ok(ClientMessage::TeleportWall {
                    dest_board,
                    ball_name,
                    velocity: Vector2::new(vx, vy),
                    position: Vector2::new(x, y),
                    wall,
                })
            }
            "connectPortal=" => Ok(ClientMessage::ConnectPortal {
                portal_name: next(tokens.next(), "portalName")?.to_string(),
            }),
            "disconnectPortal=" => Ok(ClientMessage::DisconnectPortal {
                portal_name: next(tokens.next(), "portalName")?.to_string(),
            }),
            other => Ok(ClientMessage::BoardName(other.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            ClientMessage::BoardName(name) => name.clone(),
            ClientMessage::Quit => "quit".to_string(),
            ClientMessage::TeleportPortal { dest_board, ball_name, velocity, portal_name } => {
                format!("teleportPortal= {dest_board} {ball_name} {} {} {portal_name}", velocity.x, velocity.y)
            }
            ClientMessage::TeleportWall { dest_board, ball_name, velocity, position, wall } => {
                format!(
                    "teleportWall= {dest_board} {ball_name} {} {} {} {} {wall}",
                    velocity.x, velocity.y, position.x, position.y
                )
            }
            ClientMessage::ConnectPortal { portal_name } => format!("connectPortal= {portal_name}"),
            ClientMessage::DisconnectPortal { portal_name } => format!("disconnectPortal= {portal_name}"),
        }
    }
}

/// A message the relay sends down to a client. Forwarded messages (the
/// `teleportPortal=`/`teleportWall=` pair) are wrapped in a `success `
/// prefix, per the relay's forwarding rule; everything else here is either a
/// direct query (`getClientBoardName`) or relay-originated bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub enum RelayMessage {
    GetClientBoardName,
    AllConnectedBoards(Vec<String>),
    JoinHorizontal { left: String, right: String },
    JoinVertical { top: String, bottom: String },
    DisconnectWall { board_name: String, wall: Wall },
    TeleportPortal {
        dest_board: String,
        ball_name: String,
        velocity: Vector2,
        portal_name: String,
    },
    TeleportWall {
        dest_board: String,
        ball_name: String,
        velocity: Vector2,
        position: Vector2,
        wall: Wall,
    },
    ConnectPortal { portal_name: String },
    DisconnectPortal { portal_name: String },
    Failure,
}

impl RelayMessage {
    pub fn parse(line: &str) -> Result<RelayMessage, ProtocolError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }
        let body = line.strip_prefix("success ").unwrap_or(line);
        let mut tokens = body.split_whitespace();
        let head = next(tokens.next(), "command")?;
        match head {
            "getClientBoardName" => Ok(RelayMessage::GetClientBoardName),
            "failure" => Ok(RelayMessage::Failure),
            "allConnectedBoards=" => {
                Ok(RelayMessage::AllConnectedBoards(tokens.map(str::to_string).collect()))
            }
            "joinHorizontal=" => Ok(RelayMessage::JoinHorizontal {
                left: next(tokens.next(), "left")?.to_string(),
                right: next(tokens.next(), "right")?.to_string(),
            }),
            "joinVertical=" => Ok(RelayMessage::JoinVertical {
                top: next(tokens.next(), "top")?.to_string(),
                bottom: next(tokens.next(), "bottom")?.to_string(),
            }),
            "disconnectWall=" => {
                let board_name = next(tokens.next(), "boardName")?.to_string();
                let wall = parse_wall(tokens.next())?;
                Ok(RelayMessage::DisconnectWall { board_name, wall })
            }
            "teleportPortal=" => {
                // The relay forwards this line largely as received (just the
                // `success ` prefix added), so destBoard is still the first
                // field after the command, same as on the client → relay leg.
                let dest_board = next(tokens.next(), "destBoard")?.to_string();
                let ball_name = next(tokens.next(), "ballName")?.to_string();
                let vx = parse_f64(tokens.next(), "vx")?;
                let vy = parse_f64(tokens.next(), "vy")?;
                let portal_name = next(tokens.next(), "portalName")?.to_string();
                Ok(RelayMessage::TeleportPortal {
                    dest_board,
                    ball_name,
                    velocity: Vector2::new(vx, vy),
                    portal_name,
                })
            }
            "teleportWall=" => {
                let dest_board = next(tokens.next(), "destBoard")?.to_string();
                let ball_name = next(tokens.next(), "ballName")?.to_string();
                let vx = parse_f64(tokens.next(), "vx")?;
                let vy = parse_f64(tokens.next(), "vy")?;
                let x = parse_f64(tokens.next(), "x")?;
                let y = parse_f64(tokens.next(), "y")?;
                let wall = parse_wall(tokens.next())?;
                Ok(RelayMessage::TeleportWall {
                    dest_board,
                    ball_name,
                    velocity: Vector2::new(vx, vy),
                    position: Vector2::new(x, y),
                    wall,
                })
            }
            "connectPortal=" => Ok(RelayMessage::ConnectPortal {
                portal_name: next(tokens.next(), "portalName")?.to_string(),
            }),
            "disconnectPortal=" => Ok(RelayMessage::DisconnectPortal {
                portal_name: next(tokens.next(), "portalName")?.to_string(),
            }),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// True for messages that, per the relay's forwarding rule, must carry
    /// the `success ` prefix on the wire.
    fn is_forwarded(&self) -> bool {
        matches!(
            self,
            RelayMessage::AllConnectedBoards(_)
                | RelayMessage::JoinHorizontal { .. }
                | RelayMessage::JoinVertical { .. }
                | RelayMessage::DisconnectWall { .. }
                | RelayMessage::TeleportPortal { .. }
                | RelayMessage::TeleportWall { .. }
                | RelayMessage::ConnectPortal { .. }
                | RelayMessage::DisconnectPortal { .. }
        )
    }

    pub fn encode(&self) -> String {
        let body = match self {
            RelayMessage::GetClientBoardName => "getClientBoardName".to_string(),
            RelayMessage::Failure => "failure".to_string(),
            RelayMessage::AllConnectedBoards(names) => {
                format!("allConnectedBoards= {}", names.join(" "))
            }
            RelayMessage::JoinHorizontal { left, right } => format!("joinHorizontal= {left} {right}"),
            RelayMessage::JoinVertical { top, bottom } => format!("joinVertical= {top} {bottom}"),
            RelayMessage::DisconnectWall { board_name, wall } => {
                format!("disconnectWall= {board_name} {wall}")
            }
            RelayMessage::TeleportPortal { dest_board, ball_name, velocity, portal_name } => {
                format!("teleportPortal= {dest_board} {ball_name} {} {} {portal_name}", velocity.x, velocity.y)
            }
            RelayMessage::TeleportWall { dest_board, ball_name, velocity, position, wall } => {
                format!(
                    "teleportWall= {dest_board} {ball_name} {} {} {} {} {wall}",
                    velocity.x, velocity.y, position.x, position.y
                )
            }
            RelayMessage::ConnectPortal { portal_name } => format!("connectPortal= {portal_name}"),
            RelayMessage::DisconnectPortal { portal_name } => format!("disconnectPortal= {portal_name}"),
        };
        if self.is_forwarded() {
            format!("success {body}")
        } else {
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_opposite_is_involution() {
        for wall in Wall::ALL {
            assert_eq!(wall.opposite().opposite(), wall);
        }
    }

    #[test]
    fn wall_round_trips_through_str() {
        for wall in Wall::ALL {
            assert_eq!(Wall::parse(wall.as_str()), Some(wall));
        }
    }

    #[test]
    fn client_quit_round_trip() {
        let msg = ClientMessage::Quit;
        assert_eq!(ClientMessage::parse(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn client_teleport_wall_round_trip() {
        let msg = ClientMessage::TeleportWall {
            dest_board: "B".to_string(),
            ball_name: "ballA".to_string(),
            velocity: Vector2::new(10.0, 0.0),
            position: Vector2::new(20.0, 3.5),
            wall: Wall::Right,
        };
        assert_eq!(ClientMessage::parse(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn client_teleport_portal_round_trip() {
        let msg = ClientMessage::TeleportPortal {
            dest_board: "B".to_string(),
            ball_name: "ball1".to_string(),
            velocity: Vector2::new(3.0, 0.0),
            portal_name: "P2".to_string(),
        };
        assert_eq!(ClientMessage::parse(&msg.encode()).unwrap(), msg);
    }

    #[test]
    fn relay_message_forwarded_gets_success_prefix() {
        let msg = RelayMessage::JoinHorizontal { left: "A".to_string(), right: "B".to_string() };
        assert!(msg.encode().starts_with("success "));
    }

    #[test]
    fn relay_get_board_name_is_not_prefixed() {
        assert_eq!(RelayMessage::GetClientBoardName.encode(), "getClientBoardName");
    }

    #[test]
    fn relay_failure_is_not_prefixed() {
        assert_eq!(RelayMessage::Failure.encode(), "failure");
    }

    #[test]
    fn relay_teleport_wall_round_trip_through_success_prefix() {
        let msg = RelayMessage::TeleportWall {
            dest_board: "B".to_string(),
            ball_name: "ballA".to_string(),
            velocity: Vector2::new(10.0, 0.0),
            position: Vector2::new(20.0, 4.0),
            wall: Wall::Right,
        };
        let encoded = msg.encode();
        assert!(encoded.starts_with("success teleportWall="));
        assert_eq!(RelayMessage::parse(&encoded).unwrap(), msg);
    }

    #[test]
    fn relay_teleport_portal_round_trip_through_success_prefix() {
        let msg = RelayMessage::TeleportPortal {
            dest_board: "B".to_string(),
            ball_name: "ball1".to_string(),
            velocity: Vector2::new(3.0, 0.0),
            portal_name: "P2".to_string(),
        };
        let encoded = msg.encode();
        assert!(encoded.starts_with("success teleportPortal="));
        assert_eq!(RelayMessage::parse(&encoded).unwrap(), msg);
    }

    #[test]
    fn relay_all_connected_boards_round_trip() {
        let msg = RelayMessage::AllConnectedBoards(vec!["A".to_string(), "B".to_string(), "C".to_string()]);
        let encoded = msg.encode();
        assert_eq!(RelayMessage::parse(&encoded).unwrap(), msg);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let err = RelayMessage::parse("bogusCommand= foo").unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand("bogusCommand=".to_string()));
    }

    #[test]
    fn empty_line_is_an_error() {
        assert_eq!(ClientMessage::parse("").unwrap_err(), ProtocolError::EmptyLine);
        assert_eq!(RelayMessage::parse("\n").unwrap_err(), ProtocolError::EmptyLine);
    }

    #[test]
    fn malformed_teleport_wall_missing_fields() {
        let err = RelayMessage::parse("success teleportWall= ballA 10 0").unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }
}
