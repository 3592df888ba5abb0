//! Geometry kernel, board configuration, and the board-linking wire protocol
//! shared between `engine`, `relay`, and `client`. No networking, no file
//! I/O, no rendering — everything here is a pure type or a pure function.

pub mod config;
pub mod geometry;
pub mod protocol;
