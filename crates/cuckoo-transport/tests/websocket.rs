//! Integration tests for the WebSocket transport.

use cuckoo_transport::{Connection, Transport, WebSocketTransport};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

/// Binds a transport on an OS-assigned port and returns it with its addr.
async fn bind() -> (WebSocketTransport, String) {
    let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap().to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_accept_assigns_distinct_ids() {
    let (mut transport, addr) = bind().await;

    let url = format!("ws://{addr}");
    let client_a = tokio::spawn(tokio_tungstenite::connect_async(url.clone()));
    let conn_a = transport.accept().await.unwrap();
    let client_b = tokio::spawn(tokio_tungstenite::connect_async(url));
    let conn_b = transport.accept().await.unwrap();

    assert_ne!(conn_a.id(), conn_b.id());
    client_a.await.unwrap().unwrap();
    client_b.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_binary_round_trip() {
    let (mut transport, addr) = bind().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws.send(Message::Binary(b"hello".to_vec().into())).await.unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        assert_eq!(reply.into_data().as_ref(), b"world");
    });

    let conn = transport.accept().await.unwrap();
    let received = conn.recv().await.unwrap().unwrap();
    assert_eq!(received, b"hello");
    conn.send(b"world").await.unwrap();

    client.await.unwrap();
}

#[tokio::test]
async fn test_text_frames_are_received_as_bytes() {
    // Browser clients send JSON as text frames; the transport must hand
    // those back as raw bytes just like binary frames.
    let (mut transport, addr) = bind().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws.send(Message::Text("{\"type\":\"CreateRoom\"}".into()))
            .await
            .unwrap();
        ws
    });

    let conn = transport.accept().await.unwrap();
    let received = conn.recv().await.unwrap().unwrap();
    assert_eq!(received, b"{\"type\":\"CreateRoom\"}");

    drop(client.await.unwrap());
}

#[tokio::test]
async fn test_clean_close_yields_none() {
    let (mut transport, addr) = bind().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let conn = transport.accept().await.unwrap();
    assert!(conn.recv().await.unwrap().is_none());

    client.await.unwrap();
}
