//! The pinball relay: a line-oriented TCP server that stitches
//! independently-running boards together edge-to-edge and peers their
//! portals.
//!
//! # Architecture
//!
//! - **`session`** — one task per client connection: registration
//!   handshake, then a read loop that routes or broadcasts each
//!   `ClientMessage`, plus a writer task owning the socket's write half.
//! - **`registry`** — the board-name -> connection map shared across
//!   every session and the operator console.
//! - **`join`** — wall-adjacency bookkeeping for the `h`/`v` operator
//!   commands, including eviction of a wall's previous neighbour.
//! - **`operator`** — the stdin console (`h`, `v`, `disconnect`, `quit`),
//!   kept thin and separate from the router core above.
//! - **`config`** — `RelayConfig`: listen port.

pub mod config;
pub mod join;
pub mod operator;
pub mod registry;
pub mod session;
