//! The relay's single piece of shared state: a board-name to connection
//! map. Every reader task looks clients up here to forward a line; the
//! operator loop walks it to join or disconnect boards. Guarded by a
//! `tokio::sync::Mutex` since lock hold times are a channel send, not I/O.

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};

/// What gets pushed down a connection's write-side channel.
#[derive(Debug, Clone)]
pub enum WriterMsg {
    Line(String),
    Close,
}

pub type Outbox = mpsc::UnboundedSender<WriterMsg>;

#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<HashMap<String, Outbox>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` to `outbox`. Fails if the name is already taken,
    /// keeping the map injective as required by the board-name invariant.
    pub async fn register(&self, name: String, outbox: Outbox) -> Result<(), String> {
        let mut guard = self.inner.lock().await;
        if guard.contains_key(&name) {
            return Err(format!("board name already connected: {name}"));
        }
        guard.insert(name, outbox);
        Ok(())
    }

    pub async fn remove(&self, name: &str) {
        self.inner.lock().await.remove(name);
    }

    pub async fn send_line(&self, name: &str, line: String) -> bool {
        let guard = self.inner.lock().await;
        match guard.get(name) {
            Some(tx) => tx.send(WriterMsg::Line(line)).is_ok(),
            None => false,
        }
    }

    pub async fn broadcast_line(&self, line: String, except: Option<&str>) {
        let guard = self.inner.lock().await;
        for (name, tx) in guard.iter() {
            if Some(name.as_str()) == except {
                continue;
            }
            let _ = tx.send(WriterMsg::Line(line.clone()));
        }
    }

    pub async fn close_all(&self) {
        let guard = self.inner.lock().await;
        for tx in guard.values() {
            let _ = tx.send(WriterMsg::Close);
        }
    }

    pub async fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.inner.lock().await.contains_key(name)
    }
}
