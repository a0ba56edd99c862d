use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;

use super::connections::{ConnectionId, ConnectionSet, ReadyState};

/// Transitions reported to the `on_event` callback of [`drive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection is open and counted in the set.
    Opened(ConnectionId),
    /// The connection has closed and left the set.
    Closed(ConnectionId),
}

/// Runs one WebSocket connection to completion.
///
/// The socket joins `connections` and stays there until the peer closes or
/// the transport fails. Outbound messages queued on the set are written by a
/// separate task. Inbound payloads are read and discarded.
///
/// `on_event` is called after the socket is marked open, and again after it
/// has been removed from the set. Returns once the socket has been closed.
pub async fn drive<S, E, F>(socket: S, connections: ConnectionSet, on_event: F)
where
    S: Stream<Item = Result<Message, E>> + Sink<Message> + Send + 'static,
    <S as Sink<Message>>::Error: Send,
    E: fmt::Display + Send,
    F: Fn(ConnectionEvent, &ConnectionSet) + Send,
{
    let (id, mut outbox) = connections.register();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    connections.set_state(id, ReadyState::Open);
    tracing::debug!(%id, "websocket connection open");
    on_event(ConnectionEvent::Opened(id), &connections);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%id, "websocket read failed: {}", e);
                break;
            }
        }
    }

    connections.set_state(id, ReadyState::Closing);
    connections.remove(id);
    tracing::debug!(%id, "websocket connection closed");
    on_event(ConnectionEvent::Closed(id), &connections);

    // Removal dropped the outbox sender; the writer drains, then completes the close handshake
    let _ = writer.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use std::time::Duration;

    /// In-memory stand-in for an upgraded socket.
    struct FakeSocket {
        inbound: mpsc::UnboundedReceiver<Result<Message, Infallible>>,
        outbound: mpsc::UnboundedSender<Message>,
    }

    struct Client {
        to_server: mpsc::UnboundedSender<Result<Message, Infallible>>,
        from_server: mpsc::UnboundedReceiver<Message>,
    }

    fn pair() -> (FakeSocket, Client) {
        let (to_server, inbound) = mpsc::unbounded();
        let (outbound, from_server) = mpsc::unbounded();
        (
            FakeSocket { inbound, outbound },
            Client {
                to_server,
                from_server,
            },
        )
    }

    impl Stream for FakeSocket {
        type Item = Result<Message, Infallible>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Pin::new(&mut self.inbound).poll_next(cx)
        }
    }

    impl Sink<Message> for FakeSocket {
        type Error = mpsc::SendError;

        fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Pin::new(&mut self.outbound).poll_ready(cx)
        }

        fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
            Pin::new(&mut self.outbound).start_send(item)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Pin::new(&mut self.outbound).poll_flush(cx)
        }

        fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Pin::new(&mut self.outbound).poll_close(cx)
        }
    }

    async fn next_text(client: &mut Client) -> String {
        let message = tokio::time::timeout(Duration::from_secs(1), client.from_server.next())
            .await
            .expect("timed out waiting for a message")
            .expect("socket closed");
        match message {
            Message::Text(text) => text.as_str().to_owned(),
            other => panic!("unexpected message {:?}", other),
        }
    }

    fn announce_count(_: ConnectionEvent, set: &ConnectionSet) {
        set.broadcast(Message::Text(set.len().to_string().into()));
    }

    #[tokio::test]
    async fn test_open_and_close_events_reach_open_peers() {
        let set = ConnectionSet::new();

        let (socket_a, mut a) = pair();
        let session_a = tokio::spawn(drive(socket_a, set.clone(), announce_count));
        assert_eq!(next_text(&mut a).await, "1");

        let (socket_b, mut b) = pair();
        let _session_b = tokio::spawn(drive(socket_b, set.clone(), announce_count));
        assert_eq!(next_text(&mut a).await, "2");
        assert_eq!(next_text(&mut b).await, "2");

        a.to_server.unbounded_send(Ok(Message::Close(None))).unwrap();
        session_a.await.unwrap();

        assert_eq!(next_text(&mut b).await, "1");
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_socket_is_closed_after_peer_leaves() {
        let set = ConnectionSet::new();
        let (socket, mut client) = pair();
        let session = tokio::spawn(drive(socket, set.clone(), announce_count));
        assert_eq!(next_text(&mut client).await, "1");

        client.to_server.unbounded_send(Ok(Message::Close(None))).unwrap();
        session.await.unwrap();

        // The server side has closed its half, so the stream ends instead of hanging
        let end = tokio::time::timeout(Duration::from_secs(1), client.from_server.next())
            .await
            .expect("socket left open");
        assert!(end.is_none());
    }

    #[tokio::test]
    async fn test_inbound_payloads_are_ignored() {
        let set = ConnectionSet::new();
        let events = Arc::new(Mutex::new(Vec::<ConnectionEvent>::new()));

        let (socket, client) = pair();
        let session = tokio::spawn(drive(socket, set.clone(), {
            let events = events.clone();
            move |event: ConnectionEvent, _: &ConnectionSet| events.lock().unwrap().push(event)
        }));

        client.to_server.unbounded_send(Ok(Message::Text("hi".into()))).unwrap();
        drop(client);
        session.await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ConnectionEvent::Opened(_)));
        assert!(matches!(events[1], ConnectionEvent::Closed(_)));
        assert!(set.is_empty());
    }
}
