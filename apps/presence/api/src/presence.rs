//! Live count of connected WebSocket clients.
//!
//! Every connect and disconnect pushes the new total to every open socket.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use axum_helpers::ws::{ConnectionSet, drive};
use serde::Serialize;

/// Messages pushed to presence clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceMessage {
    UpdateCount { total: usize },
}

/// Sends the current connection count to every open connection.
///
/// Returns how many connections the update was queued for.
pub fn broadcast_total(connections: &ConnectionSet) -> usize {
    let total = connections.len();
    tracing::debug!("{} client(s) connected", total);

    match serde_json::to_string(&PresenceMessage::UpdateCount { total }) {
        Ok(payload) => connections.broadcast(Message::Text(payload.into())),
        Err(e) => {
            tracing::error!("failed to encode presence update: {}", e);
            0
        }
    }
}

async fn upgrade(ws: WebSocketUpgrade, State(connections): State<ConnectionSet>) -> Response {
    ws.on_upgrade(move |socket| {
        drive(socket, connections, |_, set| {
            broadcast_total(set);
        })
    })
}

/// The WebSocket endpoint, mounted at `path`.
pub fn router(connections: ConnectionSet, path: &str) -> Router {
    Router::new()
        .route(path, get(upgrade))
        .with_state(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::ws::ReadyState;
    use serde_json::{Value, json};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn open(set: &ConnectionSet) -> (axum_helpers::ws::ConnectionId, UnboundedReceiver<Message>) {
        let (id, rx) = set.register();
        set.set_state(id, ReadyState::Open);
        (id, rx)
    }

    fn received(rx: &mut UnboundedReceiver<Message>) -> Value {
        match rx.try_recv().unwrap() {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_update_count_wire_format() {
        let json = serde_json::to_value(PresenceMessage::UpdateCount { total: 3 }).unwrap();
        assert_eq!(json, json!({"type": "update_count", "total": 3}));
    }

    #[test]
    fn test_counts_follow_connects_and_disconnects() {
        let set = ConnectionSet::new();

        let (a, mut a_rx) = open(&set);
        assert_eq!(broadcast_total(&set), 1);
        assert_eq!(received(&mut a_rx), json!({"type": "update_count", "total": 1}));

        let (_b, mut b_rx) = open(&set);
        assert_eq!(broadcast_total(&set), 2);
        assert_eq!(received(&mut a_rx)["total"], 2);
        assert_eq!(received(&mut b_rx)["total"], 2);

        set.remove(a);
        assert_eq!(broadcast_total(&set), 1);
        assert_eq!(received(&mut b_rx)["total"], 1);
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn test_no_clients_is_a_noop() {
        assert_eq!(broadcast_total(&ConnectionSet::new()), 0);
    }

    #[test]
    fn test_connecting_peer_is_counted_but_not_notified() {
        let set = ConnectionSet::new();
        let (_, mut open_rx) = open(&set);
        let (_, mut pending_rx) = set.register();

        assert_eq!(broadcast_total(&set), 1);
        assert_eq!(received(&mut open_rx)["total"], 2);
        assert!(pending_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_router_pushes_counts_and_closes_cleanly() {
        use axum_helpers::server::{BoundListener, serve};
        use futures::{SinkExt, StreamExt};
        use std::time::Duration;
        use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

        type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

        async fn next_total(ws: &mut Client) -> u64 {
            let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
                .await
                .expect("timed out waiting for an update")
                .expect("socket ended")
                .unwrap();
            match frame {
                tungstenite::Message::Text(text) => {
                    let update: Value = serde_json::from_str(text.as_str()).unwrap();
                    assert_eq!(update["type"], "update_count");
                    update["total"].as_u64().unwrap()
                }
                other => panic!("unexpected frame {:?}", other),
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/", listener.local_addr().unwrap());
        tokio::spawn(serve(
            router(ConnectionSet::new(), "/"),
            BoundListener::Tcp(listener),
            std::future::pending(),
        ));

        let (mut a, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(next_total(&mut a).await, 1);

        let (mut b, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(next_total(&mut a).await, 2);
        assert_eq!(next_total(&mut b).await, 2);

        a.close(None).await.unwrap();
        let reply = tokio::time::timeout(Duration::from_secs(2), a.next())
            .await
            .expect("no close reply");
        assert!(matches!(reply, Some(Ok(tungstenite::Message::Close(_)))));

        assert_eq!(next_total(&mut b).await, 1);
        b.send(tungstenite::Message::text("ignored")).await.unwrap();
        b.close(None).await.unwrap();
    }
}
