//! The rendering seam. `engine` only ever hands out a [`BoardSnapshot`];
//! what a renderer does with it is entirely this crate's business. The
//! windowed GUI renderer named in the board's scope is a different
//! `BoardRenderer` implementation left for a future collaborator — this
//! one is textual, so the whole system can run and be tested headless.

use pinball_engine::{BoardSnapshot, Gadget};

pub trait BoardRenderer {
    fn render(&mut self, snapshot: &BoardSnapshot<'_>);
}

/// Prints a one-line-per-ball, one-line-per-gadget summary to stdout.
/// Good enough to watch a board run from a terminal.
pub struct TextRenderer {
    frame: u64,
}

impl Default for TextRenderer {
    fn default() -> Self {
        TextRenderer { frame: 0 }
    }
}

impl BoardRenderer for TextRenderer {
    fn render(&mut self, snapshot: &BoardSnapshot<'_>) {
        self.frame += 1;
        println!("-- {} frame {} --", snapshot.name, self.frame);
        for ball in snapshot.balls {
            println!("  ball {:<12} ({:6.2}, {:6.2}) v=({:6.2}, {:6.2})", ball.name, ball.position.x, ball.position.y, ball.velocity.x, ball.velocity.y);
        }
        for gadget in snapshot.gadgets {
            if let Gadget::Flipper(f) = gadget {
                if f.is_moving {
                    println!("  flipper {:<12} rotation={:5.1}deg", f.name, f.rotation.to_degrees());
                }
            }
        }
        for (wall, remote) in snapshot.join_state {
            if let Some(remote) = remote {
                println!("  wall {wall} -> {remote}");
            }
        }
    }
}

/// Renders nothing; useful for tests and for running a board as a pure
/// relay-connected simulator with no terminal attached.
#[derive(Default)]
pub struct NullRenderer;

impl BoardRenderer for NullRenderer {
    fn render(&mut self, _snapshot: &BoardSnapshot<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinball_engine::Board;

    #[test]
    fn null_renderer_does_not_panic_on_an_empty_board() {
        let board = Board::new("empty");
        NullRenderer.render(&board.snapshot());
    }

    #[test]
    fn text_renderer_tracks_frame_count() {
        let board = Board::new("empty");
        let mut renderer = TextRenderer::default();
        renderer.render(&board.snapshot());
        renderer.render(&board.snapshot());
        assert_eq!(renderer.frame, 2);
    }
}
