//! The input seam, mirroring `render`: the board's key-event plumbing is
//! an external collaborator with a single job — turn a raw key event
//! into `(key, is_down)` pairs the main loop feeds through
//! [`crate::boardfile::KeyBindings`] into `Board::trigger_by_name`.

pub enum KeyEvent {
    Down(String),
    Up(String),
}

pub trait InputSource {
    /// Drains whatever key events have arrived since the last call.
    /// Never blocks.
    fn poll(&mut self) -> Vec<KeyEvent>;
}

/// No input at all; useful for a headless relay-only board.
#[derive(Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn poll(&mut self) -> Vec<KeyEvent> {
        Vec::new()
    }
}

/// Reads whitespace-separated `keydown KEY` / `keyup KEY` lines from a
/// channel fed by a background stdin reader. Lets a board be driven
/// interactively from a terminal without any GUI toolkit.
pub struct LineInput {
    rx: tokio::sync::mpsc::UnboundedReceiver<KeyEvent>,
}

impl LineInput {
    pub fn spawn() -> LineInput {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(async move {
            use tokio::io::{AsyncBufReadExt, BufReader};
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(event) = parse_line(&line) {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });
        LineInput { rx }
    }
}

impl InputSource for LineInput {
    fn poll(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

fn parse_line(line: &str) -> Option<KeyEvent> {
    let mut tokens = line.split_whitespace();
    match tokens.next()? {
        "keydown" => Some(KeyEvent::Down(tokens.next()?.to_string())),
        "keyup" => Some(KeyEvent::Up(tokens.next()?.to_string())),
        _ => None,
    }
}
