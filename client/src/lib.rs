//! The pinball client: loads a board-definition file, drives its
//! `pinball_engine::Board` at a fixed cadence, and optionally relays
//! cross-board ball traffic over a TCP connection to `pinball-relay`.
//!
//! Rendering and input are external collaborators behind the
//! [`render::BoardRenderer`] / [`input::InputSource`] traits; this crate
//! ships only a textual implementation of each.

pub mod boardfile;
pub mod config;
pub mod error;
pub mod input;
pub mod render;
pub mod session;
