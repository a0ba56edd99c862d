//! WebSocket connection tracking and fan-out.
//!
//! ```ignore
//! use axum_helpers::ws::{drive, ConnectionSet};
//!
//! async fn upgrade(ws: WebSocketUpgrade, State(connections): State<ConnectionSet>) -> Response {
//!     ws.on_upgrade(move |socket| drive(socket, connections, |_, set| {
//!         set.broadcast(Message::Text(set.len().to_string().into()));
//!     }))
//! }
//! ```

mod connections;
mod session;

pub use connections::{ConnectionId, ConnectionSet, ReadyState};
pub use session::{ConnectionEvent, drive};
