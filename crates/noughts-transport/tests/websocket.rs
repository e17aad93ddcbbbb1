//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use noughts_transport::{
        Connection, Handshake, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on port 0 and returns the transport plus its real address.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn accept_ws(transport: &mut WebSocketTransport) -> WebSocketConnection {
        let handshake = transport.accept().await.expect("should accept");
        handshake.complete().await.expect("handshake should complete")
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, addr) = bind().await;

        let server_handle =
            tokio::spawn(async move { accept_ws(&mut transport).await });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // JSON goes out as a text frame.
        server_conn
            .send(br#"{"type":"name-set"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "utf-8 payloads should be text frames");
        assert_eq!(msg.into_data().as_ref(), br#"{"type":"name-set"}"#);

        // Text from the client arrives as bytes.
        client_ws
            .send(Message::Text(r#"{"type":"create-session"}"#.into()))
            .await
            .unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"type":"create-session"}"#);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_non_utf8_goes_out_as_binary() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move { accept_ws(&mut transport).await });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        server_conn.send(&[0xff, 0xfe]).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_is_pending() {
        // One task parks in recv(); another must still be able to send.
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move { accept_ws(&mut transport).await });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = Arc::new(server_handle.await.unwrap());

        let reader = Arc::clone(&server_conn);
        let pending_recv = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), server_conn.send(b"hello"))
            .await
            .expect("send must not wait for recv")
            .unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"hello");

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = pending_recv.await.unwrap().unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move { accept_ws(&mut transport).await });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            let a = accept_ws(&mut transport).await;
            let b = accept_ws(&mut transport).await;
            (a.id(), b.id())
        });
        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;

        let (a, b) = server_handle.await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_accept_returns_before_handshake() {
        let (mut transport, addr) = bind().await;

        // Connects but never sends an upgrade request.
        let _silent = TcpStream::connect(&addr).await.unwrap();
        let silent = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("accept must not wait for the handshake")
            .unwrap();

        let client = tokio::spawn({
            let addr = addr.clone();
            async move { connect_client(&addr).await }
        });
        let honest = tokio::time::timeout(Duration::from_secs(1), async {
            transport.accept().await.unwrap().complete().await.unwrap()
        })
        .await
        .expect("second client must not queue behind the silent one");

        assert_ne!(honest.peer_addr(), silent.peer_addr());
        client.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_complete_rejects_garbage() {
        let (mut transport, addr) = bind().await;

        let mut raw = TcpStream::connect(&addr).await.unwrap();
        let handshake = transport.accept().await.unwrap();
        raw.write_all(b"hello there\r\n\r\n").await.unwrap();
        drop(raw);

        let result = handshake.complete().await;
        assert!(matches!(result, Err(TransportError::Upgrade { .. })));
    }
}
