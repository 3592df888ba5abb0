//! The physics/simulation core: gadgets, the board aggregate, and the
//! per-frame earliest-collision simulator loop. No networking, no file
//! I/O, no rendering — `relay` and `client` are the only consumers.

pub mod ball;
pub mod board;
pub mod error;
pub mod gadget;

pub use ball::Ball;
pub use board::{Board, BoardSnapshot, GadgetHandle};
pub use error::BoardError;
pub use gadget::{Absorber, Bumper, BumperShape, Flipper, Gadget, Handedness, Portal};
