//! Wall-to-wall adjacency bookkeeping for the operator's `h`/`v` commands.
//!
//! The relay does not simulate anything; it only remembers which board's
//! right wall currently faces which board's left wall (and top/bottom the
//! same way), so that joining a wall that was already spoken for can evict
//! the previous neighbour and tell it so.

use std::collections::HashMap;

use pinball_shared::protocol::{RelayMessage, Wall};

/// A notification to deliver to one board because a wall it was relying
/// on just broke.
pub struct Eviction {
    pub recipient: String,
    pub message: RelayMessage,
}

#[derive(Default)]
pub struct JoinTable {
    /// left board name -> right board name
    horizontal: HashMap<String, String>,
    /// top board name -> bottom board name
    vertical: HashMap<String, String>,
}

impl JoinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `left`'s right wall to `right`'s left wall, evicting whoever
    /// previously held either side.
    pub fn join_horizontal(&mut self, left: &str, right: &str) -> Vec<Eviction> {
        let mut evictions = Vec::new();
        if let Some(old_right) = self.horizontal.get(left).cloned() {
            if old_right != right {
                self.horizontal.remove(left);
                evictions.push(Eviction {
                    recipient: old_right,
                    message: RelayMessage::DisconnectWall { board_name: left.to_string(), wall: Wall::Right },
                });
            }
        }
        if let Some(old_left) = self.reverse_horizontal(right) {
            if old_left != left {
                self.horizontal.remove(&old_left);
                evictions.push(Eviction {
                    recipient: old_left,
                    message: RelayMessage::DisconnectWall { board_name: right.to_string(), wall: Wall::Left },
                });
            }
        }
        self.horizontal.insert(left.to_string(), right.to_string());
        evictions
    }

    pub fn join_vertical(&mut self, top: &str, bottom: &str) -> Vec<Eviction> {
        let mut evictions = Vec::new();
        if let Some(old_bottom) = self.vertical.get(top).cloned() {
            if old_bottom != bottom {
                self.vertical.remove(top);
                evictions.push(Eviction {
                    recipient: old_bottom,
                    message: RelayMessage::DisconnectWall { board_name: top.to_string(), wall: Wall::Bottom },
                });
            }
        }
        if let Some(old_top) = self.reverse_vertical(bottom) {
            if old_top != top {
                self.vertical.remove(&old_top);
                evictions.push(Eviction {
                    recipient: old_top,
                    message: RelayMessage::DisconnectWall { board_name: bottom.to_string(), wall: Wall::Top },
                });
            }
        }
        self.vertical.insert(top.to_string(), bottom.to_string());
        evictions
    }

    /// Clears every join this board participates in, returning the
    /// notifications owed to its former neighbours.
    pub fn disconnect_board(&mut self, name: &str) -> Vec<Eviction> {
        let mut evictions = Vec::new();
        if let Some(right) = self.horizontal.remove(name) {
            evictions.push(Eviction {
                recipient: right,
                message: RelayMessage::DisconnectWall { board_name: name.to_string(), wall: Wall::Right },
            });
        }
        if let Some(left) = self.reverse_horizontal(name) {
            self.horizontal.remove(&left);
            evictions.push(Eviction {
                recipient: left,
                message: RelayMessage::DisconnectWall { board_name: name.to_string(), wall: Wall::Left },
            });
        }
        if let Some(bottom) = self.vertical.remove(name) {
            evictions.push(Eviction {
                recipient: bottom,
                message: RelayMessage::DisconnectWall { board_name: name.to_string(), wall: Wall::Bottom },
            });
        }
        if let Some(top) = self.reverse_vertical(name) {
            self.vertical.remove(&top);
            evictions.push(Eviction {
                recipient: top,
                message: RelayMessage::DisconnectWall { board_name: name.to_string(), wall: Wall::Top },
            });
        }
        evictions
    }

    fn reverse_horizontal(&self, right: &str) -> Option<String> {
        self.horizontal.iter().find(|(_, r)| r.as_str() == right).map(|(l, _)| l.clone())
    }

    fn reverse_vertical(&self, bottom: &str) -> Option<String> {
        self.vertical.iter().find(|(_, b)| b.as_str() == bottom).map(|(t, _)| t.clone())
    }
}
