use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Lifecycle of a WebSocket connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

struct Peer {
    state: ReadyState,
    outbox: mpsc::UnboundedSender<Message>,
}

/// The set of live WebSocket connections on one endpoint.
///
/// Each connection owns an outbox; messages pushed here are written to the
/// socket by the connection's own task, so sending never blocks on I/O.
#[derive(Clone, Default)]
pub struct ConnectionSet {
    peers: Arc<Mutex<HashMap<ConnectionId, Peer>>>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection in the `Connecting` state and returns its outbox receiver.
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<Message>) {
        let id = Uuid::new_v4();
        let (outbox, rx) = mpsc::unbounded_channel();
        self.peers().insert(
            id,
            Peer {
                state: ReadyState::Connecting,
                outbox,
            },
        );
        (id, rx)
    }

    pub fn set_state(&self, id: ConnectionId, state: ReadyState) -> bool {
        match self.peers().get_mut(&id) {
            Some(peer) => {
                peer.state = state;
                true
            }
            None => false,
        }
    }

    /// `Closed` for connections that are no longer in the set.
    pub fn state(&self, id: ConnectionId) -> ReadyState {
        self.peers()
            .get(&id)
            .map_or(ReadyState::Closed, |peer| peer.state)
    }

    pub fn remove(&self, id: ConnectionId) -> bool {
        self.peers().remove(&id).is_some()
    }

    /// Number of connections in the set, whatever their state.
    pub fn len(&self) -> usize {
        self.peers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers().is_empty()
    }

    /// Queues `message` for every open connection and returns how many accepted it.
    ///
    /// Connections in any other state are skipped. A connection whose task
    /// has already gone away is skipped too; the others still get the message.
    pub fn broadcast(&self, message: Message) -> usize {
        let open: Vec<_> = self
            .peers()
            .iter()
            .filter(|(_, peer)| peer.state == ReadyState::Open)
            .map(|(id, peer)| (*id, peer.outbox.clone()))
            .collect();

        open.into_iter()
            .filter(|(id, outbox)| match outbox.send(message.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(%id, "dropping message for departed connection");
                    false
                }
            })
            .count()
    }

    fn peers(&self) -> MutexGuard<'_, HashMap<ConnectionId, Peer>> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
