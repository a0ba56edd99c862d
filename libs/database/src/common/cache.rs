use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

use super::{DatabaseError, DatabaseResult};

/// Creates connected clients for a connection string.
///
/// Implementations must call [`CloseSignal::notify`] once the underlying
/// client is closed, whether the close came from the driver or from the
/// application.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Client: Clone + Send + Sync + 'static;

    async fn connect(&self, uri: &str, on_close: CloseSignal) -> DatabaseResult<Self::Client>;
}

/// Callback handed to a [`Connector`] that clears the cache entry it belongs to.
#[derive(Clone)]
pub struct CloseSignal {
    hook: Arc<dyn Fn() + Send + Sync>,
}

impl CloseSignal {
    pub fn new(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            hook: Arc::new(hook),
        }
    }

    pub fn notify(&self) {
        (self.hook)()
    }
}

impl fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSignal").finish_non_exhaustive()
    }
}

type ConnectAttempt<T> = Shared<BoxFuture<'static, DatabaseResult<T>>>;

enum SlotState<T> {
    Pending(ConnectAttempt<T>),
    Ready(T),
}

struct Slot<T> {
    generation: u64,
    state: SlotState<T>,
}

struct Inner<C: Connector> {
    connector: C,
    slots: Mutex<HashMap<String, Slot<C::Client>>>,
    generations: AtomicU64,
}

impl<C: Connector> Inner<C> {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot<C::Client>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the slot for `uri` if it still belongs to `generation`.
    fn forget(&self, uri: &str, generation: u64) -> bool {
        let mut slots = self.slots();
        if slots.get(uri).is_some_and(|slot| slot.generation == generation) {
            slots.remove(uri);
            true
        } else {
            false
        }
    }
}

/// Process-wide memo of connected clients, keyed by connection string.
///
/// Build one at startup and clone it into every consumer; clones share the
/// same entries. Callers racing on an uncached key share one connect
/// attempt, so at most one client exists per key.
pub struct ConnectionCache<C: Connector> {
    inner: Arc<Inner<C>>,
}

impl<C: Connector> Clone for ConnectionCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                slots: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    /// Returns the cached client for `uri`, connecting first if there is none.
    ///
    /// A cached client is returned as is, without checking that it is still
    /// alive. Connect failures are not retried; the entry is dropped so the
    /// next call starts over.
    pub async fn acquire(&self, uri: &str) -> DatabaseResult<C::Client> {
        let (generation, attempt) = {
            let mut slots = self.inner.slots();
            let slot = slots.entry(uri.to_string()).or_insert_with(|| {
                let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
                Slot {
                    generation,
                    state: SlotState::Pending(self.start(uri, generation)),
                }
            });

            match &slot.state {
                SlotState::Ready(client) => return Ok(client.clone()),
                SlotState::Pending(attempt) => (slot.generation, attempt.clone()),
            }
        };

        match attempt.await {
            Ok(client) => {
                let mut slots = self.inner.slots();
                if let Some(slot) = slots.get_mut(uri) {
                    if slot.generation == generation && matches!(slot.state, SlotState::Pending(_))
                    {
                        slot.state = SlotState::Ready(client.clone());
                    }
                }
                Ok(client)
            }
            Err(err) => {
                self.inner.forget(uri, generation);
                Err(err)
            }
        }
    }

    /// The connected client for `uri`, if one is cached. Never connects.
    pub fn cached(&self, uri: &str) -> Option<C::Client> {
        match self.inner.slots().get(uri) {
            Some(Slot {
                state: SlotState::Ready(client),
                ..
            }) => Some(client.clone()),
            _ => None,
        }
    }

    /// Whether `uri` has an entry, connected or still connecting.
    pub fn contains(&self, uri: &str) -> bool {
        self.inner.slots().contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.inner.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots().is_empty()
    }

    /// Drops the entry for `uri` so the next [`acquire`](Self::acquire) reconnects.
    pub fn invalidate(&self, uri: &str) -> bool {
        self.inner.slots().remove(uri).is_some()
    }

    fn start(&self, uri: &str, generation: u64) -> ConnectAttempt<C::Client> {
        let inner = Arc::downgrade(&self.inner);
        let on_close = close_signal(inner.clone(), uri.to_string(), generation);
        let uri = uri.to_string();

        async move {
            let inner = inner
                .upgrade()
                .ok_or_else(|| DatabaseError::ConnectionFailed("connection cache dropped".into()))?;
            let client = inner.connector.connect(&uri, on_close).await?;
            debug!("connected to {}", uri);
            Ok(client)
        }
        .boxed()
        .shared()
    }
}

fn close_signal<C: Connector>(inner: Weak<Inner<C>>, uri: String, generation: u64) -> CloseSignal {
    CloseSignal::new(move || {
        if let Some(inner) = inner.upgrade() {
            if inner.forget(&uri, generation) {
                debug!("closed connection to {}", uri);
            }
        }
    })
}
