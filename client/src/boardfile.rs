//! Loader for the line-oriented board-definition file grammar (§6): the
//! one external collaborator the simulation core never needs to know
//! about. Kept deliberately separate from `pinball_engine`, the same way
//! the relay's operator console sits apart from its router core.

use std::collections::HashMap;
use std::path::Path;

use pinball_engine::{Absorber, Ball, Board, Bumper, BumperShape, Flipper, Handedness, Portal};
use pinball_shared::geometry::{Angle, Vector2};

use crate::error::BoardFileError;

/// `keydown`/`keyup key=K action=NAME` bindings, consulted by the input
/// adapter to translate a raw key press into `Board::trigger_by_name`.
#[derive(Debug, Default, Clone)]
pub struct KeyBindings {
    down: HashMap<String, String>,
    up: HashMap<String, String>,
}

impl KeyBindings {
    pub fn action_for_keydown(&self, key: &str) -> Option<&str> {
        self.down.get(key).map(String::as_str)
    }

    pub fn action_for_keyup(&self, key: &str) -> Option<&str> {
        self.up.get(key).map(String::as_str)
    }
}

struct Fields<'a> {
    tokens: HashMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn parse(line: &'a str) -> Fields<'a> {
        let mut tokens = HashMap::new();
        for token in line.split_whitespace().skip(1) {
            if let Some((key, value)) = token.split_once('=') {
                tokens.insert(key, value);
            }
        }
        Fields { tokens }
    }

    fn get(&self, line_no: usize, field: &str) -> Result<&'a str, BoardFileError> {
        self.tokens
            .get(field)
            .copied()
            .ok_or_else(|| BoardFileError::MissingField { line: line_no, field: field.to_string() })
    }

    fn get_opt(&self, field: &str) -> Option<&'a str> {
        self.tokens.get(field).copied()
    }

    fn f64(&self, line_no: usize, field: &str) -> Result<f64, BoardFileError> {
        let raw = self.get(line_no, field)?;
        raw.parse().map_err(|_| BoardFileError::InvalidValue {
            line: line_no,
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    fn i64(&self, line_no: usize, field: &str) -> Result<i64, BoardFileError> {
        let raw = self.get(line_no, field)?;
        raw.parse().map_err(|_| BoardFileError::InvalidValue {
            line: line_no,
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    fn orientation(&self, line_no: usize) -> Result<Angle, BoardFileError> {
        match self.get_opt("orientation") {
            None => Ok(Angle::ZERO),
            Some(raw) => match raw {
                "0" => Ok(Angle::from_degrees(0.0)),
                "90" => Ok(Angle::from_degrees(90.0)),
                "180" => Ok(Angle::from_degrees(180.0)),
                "270" => Ok(Angle::from_degrees(270.0)),
                other => Err(BoardFileError::InvalidValue {
                    line: line_no,
                    field: "orientation".to_string(),
                    value: other.to_string(),
                }),
            },
        }
    }
}

fn with_board_error(line_no: usize) -> impl Fn(pinball_engine::BoardError) -> BoardFileError {
    move |source| BoardFileError::Board { line: line_no, source }
}

pub fn load_board_file(path: &Path) -> Result<(Board, KeyBindings), BoardFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_board(&text)
}

pub fn parse_board(text: &str) -> Result<(Board, KeyBindings), BoardFileError> {
    let mut board = Board::new("unnamed");
    let mut bindings = KeyBindings::default();
    let mut pending_fires: Vec<(usize, String, String)> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = line.split_whitespace().next().unwrap_or("");
        let fields = Fields::parse(line);
        match command {
            "board" => {
                board.set_name(fields.get(line_no, "name")?);
                if let Some(g) = fields.get_opt("gravity") {
                    board.set_gravity(g.parse().map_err(|_| BoardFileError::InvalidValue {
                        line: line_no,
                        field: "gravity".to_string(),
                        value: g.to_string(),
                    })?);
                }
                if let Some(f1) = fields.get_opt("friction1") {
                    board.set_friction1(f1.parse().map_err(|_| BoardFileError::InvalidValue {
                        line: line_no,
                        field: "friction1".to_string(),
                        value: f1.to_string(),
                    })?);
                }
                if let Some(f2) = fields.get_opt("friction2") {
                    board.set_friction2(f2.parse().map_err(|_| BoardFileError::InvalidValue {
                        line: line_no,
                        field: "friction2".to_string(),
                        value: f2.to_string(),
                    })?);
                }
            }
            "ball" => {
                let name = fields.get(line_no, "name")?.to_string();
                let x = fields.f64(line_no, "x")?;
                let y = fields.f64(line_no, "y")?;
                let vx = fields.f64(line_no, "xVelocity")?;
                let vy = fields.f64(line_no, "yVelocity")?;
                board
                    .add_ball(Ball::new(name, Vector2::new(x, y), Vector2::new(vx, vy)))
                    .map_err(with_board_error(line_no))?;
            }
            "squareBumper" | "circleBumper" | "triangleBumper" => {
                let name = fields.get(line_no, "name")?.to_string();
                let x = fields.i64(line_no, "x")?;
                let y = fields.i64(line_no, "y")?;
                let shape = match command {
                    "squareBumper" => BumperShape::Square,
                    "circleBumper" => BumperShape::Circle,
                    _ => BumperShape::Triangle { orientation: fields.orientation(line_no)? },
                };
                board.add_bumper(Bumper { name, shape, x, y }).map_err(with_board_error(line_no))?;
            }
            "absorber" => {
                let name = fields.get(line_no, "name")?.to_string();
                let x = fields.i64(line_no, "x")?;
                let y = fields.i64(line_no, "y")?;
                let width = fields.i64(line_no, "width")?;
                let height = fields.i64(line_no, "height")?;
                board
                    .add_absorber(Absorber { name, x, y, width, height, queue: Vec::new() })
                    .map_err(with_board_error(line_no))?;
            }
            "leftFlipper" | "rightFlipper" => {
                let name = fields.get(line_no, "name")?.to_string();
                let x = fields.f64(line_no, "x")?;
                let y = fields.f64(line_no, "y")?;
                let orientation = fields.orientation(line_no)?;
                let handedness = if command == "leftFlipper" { Handedness::Left } else { Handedness::Right };
                board
                    .add_flipper(Flipper::new(name, Vector2::new(x, y), handedness, orientation))
                    .map_err(with_board_error(line_no))?;
            }
            "portal" => {
                let name = fields.get(line_no, "name")?.to_string();
                let x = fields.f64(line_no, "x")?;
                let y = fields.f64(line_no, "y")?;
                let remote_board = fields.get_opt("otherBoard").map(str::to_string);
                let peer_portal_name = fields.get(line_no, "otherPortal")?.to_string();
                board
                    .add_portal(Portal {
                        name,
                        position: Vector2::new(x, y),
                        remote_board,
                        peer_portal_name,
                        remote_connected: false,
                    })
                    .map_err(with_board_error(line_no))?;
            }
            "fire" => {
                let trigger = fields.get(line_no, "trigger")?.to_string();
                let action = fields.get(line_no, "action")?.to_string();
                pending_fires.push((line_no, trigger, action));
            }
            "keydown" | "keyup" => {
                let key = fields.get(line_no, "key")?.to_string();
                let action = fields.get(line_no, "action")?.to_string();
                if command == "keydown" {
                    bindings.down.insert(key, action);
                } else {
                    bindings.up.insert(key, action);
                }
            }
            other => {
                return Err(BoardFileError::UnknownCommand { line: line_no, command: other.to_string() });
            }
        }
    }

    for (_line_no, trigger, action) in pending_fires {
        board.set_trigger(&trigger, &action);
    }

    Ok((board, bindings))
}
