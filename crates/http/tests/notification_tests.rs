//! Notification subscriber against an in-process STOMP broker

#![cfg(feature = "notifications")]

use catalog_core::NotificationConfig;
use catalog_http::notifications::{Command, Frame, NotificationSubscriber};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

async fn read_frame<S>(ws: &mut S) -> Frame
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = ws.next().await.unwrap().unwrap();
        if let Message::Text(text) = message {
            if let Some(frame) = Frame::decode(text.as_str()).unwrap() {
                return frame;
            }
        }
    }
}

fn album_message() -> Frame {
    Frame {
        command: Command::Message,
        headers: vec![
            ("destination".into(), "/topic/albums".into()),
            ("subscription".into(), "sub-0".into()),
            ("message-id".into(), "1".into()),
        ],
        body: r#"{"type":"NEW_ALBUM","albumId":12,"title":"Hybrid Theory","artistName":"Linkin Park","message":"Novo álbum cadastrado: Hybrid Theory","timestamp":1700000000000}"#.into(),
    }
}

/// Accept one client and complete CONNECT and SUBSCRIBE
async fn accept_session(listener: &TcpListener, heart_beat: &str) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    read_frame(&mut ws).await;
    let connected = Frame::new(Command::Connected)
        .header("version", "1.2")
        .header("heart-beat", heart_beat);
    ws.send(Message::Text(connected.encode().into())).await.unwrap();
    read_frame(&mut ws).await;
    ws
}

#[tokio::test]
async fn test_subscriber_forwards_album_notifications() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, frames_rx) = oneshot::channel::<(Frame, Frame)>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let connect = read_frame(&mut ws).await;
        let connected = Frame::new(Command::Connected)
            .header("version", "1.2")
            .header("heart-beat", "0,0");
        ws.send(Message::Text(connected.encode().into())).await.unwrap();

        let subscribe = read_frame(&mut ws).await;
        ws.send(Message::Text(album_message().encode().into())).await.unwrap();
        let _ = frames_tx.send((connect, subscribe));

        // Keep the socket open until the subscriber goes away
        while let Some(Ok(_)) = ws.next().await {}
    });

    let config = NotificationConfig {
        ws_url: format!("ws://{addr}/ws/websocket"),
        topic: "/topic/albums".into(),
        reconnect_delay_ms: 100,
        heartbeat_ms: 0,
    };
    let mut notifications = NotificationSubscriber::new(config)
        .with_token(Some("t1".into()))
        .spawn();

    let notification = tokio::time::timeout(Duration::from_secs(5), notifications.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification.kind, "NEW_ALBUM");
    assert_eq!(notification.album_id, Some(12));
    assert_eq!(notification.message, "Novo álbum cadastrado: Hybrid Theory");

    let (connect, subscribe) = frames_rx.await.unwrap();
    assert_eq!(connect.command, Command::Connect);
    assert_eq!(connect.get("Authorization"), Some("Bearer t1"));
    assert_eq!(connect.get("accept-version"), Some("1.2,1.1"));
    assert_eq!(subscribe.command, Command::Subscribe);
    assert_eq!(subscribe.get("destination"), Some("/topic/albums"));
}

#[tokio::test]
async fn test_silent_broker_is_dropped_and_reconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        // Promises a heart-beat every 100ms, then never sends anything
        let _silent = accept_session(&listener, "100,0").await;

        let mut live = accept_session(&listener, "0,0").await;
        live.send(Message::Text(album_message().encode().into())).await.unwrap();
        while let Some(Ok(_)) = live.next().await {}
    });

    let config = NotificationConfig {
        ws_url: format!("ws://{addr}/ws/websocket"),
        topic: "/topic/albums".into(),
        reconnect_delay_ms: 50,
        heartbeat_ms: 100,
    };
    let mut notifications = NotificationSubscriber::new(config).spawn();

    let notification = tokio::time::timeout(Duration::from_secs(5), notifications.recv())
        .await
        .expect("subscriber never reconnected after the broker went silent")
        .unwrap();
    assert_eq!(notification.album_id, Some(12));
}
