//! WebSocket subscriber for the album topic

use super::NotificationError;
use super::frame::{Command, Frame, negotiate_heartbeat};
use crate::types::AlbumNotification;
use catalog_core::NotificationConfig;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, interval, sleep, sleep_until};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

const SUBSCRIPTION_ID: &str = "sub-0";

/// Follows the album topic, reconnecting until the receiver is dropped
#[derive(Debug, Clone)]
pub struct NotificationSubscriber {
    config: NotificationConfig,
    token: Option<String>,
}

impl NotificationSubscriber {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            token: None,
        }
    }

    /// Access token sent in the CONNECT frame
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Run in a background task; notifications arrive on the returned channel
    pub fn spawn(self) -> mpsc::Receiver<AlbumNotification> {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move { self.run(tx).await });
        rx
    }

    /// Follow the topic until `tx` is closed
    ///
    /// An unusable `ws_url` ends the run at once, closing the channel.
    pub async fn run(self, tx: mpsc::Sender<AlbumNotification>) {
        let host = match host_of(&self.config.ws_url) {
            Ok(host) => host,
            Err(err) => {
                error!(url = %self.config.ws_url, error = %err, "Cannot follow notifications");
                return;
            }
        };
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        loop {
            match self.session(&host, &tx).await {
                Ok(()) => debug!("Notification session closed"),
                Err(err) => warn!(error = %err, "Notification session failed"),
            }
            if tx.is_closed() {
                return;
            }
            info!(delay_ms = self.config.reconnect_delay_ms, "Reconnecting to notifications");
            tokio::select! {
                () = sleep(delay) => {}
                () = tx.closed() => return,
            }
        }
    }

    async fn session(
        &self,
        host: &str,
        tx: &mpsc::Sender<AlbumNotification>,
    ) -> Result<(), NotificationError> {
        info!(url = %self.config.ws_url, "Connecting to notifications");
        let (ws_stream, _) = connect_async(self.config.ws_url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let heartbeat = self.config.heartbeat_ms;
        let mut connect = Frame::new(Command::Connect)
            .header("accept-version", "1.2,1.1")
            .header("host", host)
            .header("heart-beat", format!("{heartbeat},{heartbeat}"));
        if let Some(token) = &self.token {
            connect = connect.header("Authorization", format!("Bearer {token}"));
        }
        write.send(Message::Text(connect.encode().into())).await?;

        let connected = loop {
            match next_frame(&mut read).await? {
                None => return Err(NotificationError::Closed),
                Some(frame) if frame.command == Command::Connected => break frame,
                Some(frame) if frame.command == Command::Error => {
                    return Err(broker_error(&frame));
                }
                Some(frame) => debug!(command = %frame.command, "Ignoring frame before CONNECTED"),
            }
        };
        let (outgoing, incoming) =
            negotiate_heartbeat((heartbeat, heartbeat), connected.get("heart-beat"));
        // Broker counts as dead after two missed heart-beats
        let silence = (incoming > 0).then(|| Duration::from_millis(incoming.saturating_mul(2)));

        let subscribe = Frame::new(Command::Subscribe)
            .header("id", SUBSCRIPTION_ID)
            .header("destination", self.config.topic.as_str())
            .header("ack", "auto");
        write.send(Message::Text(subscribe.encode().into())).await?;
        info!(topic = %self.config.topic, "Subscribed to notifications");

        let mut ticker = interval(Duration::from_millis(outgoing.max(1)));
        let mut last_seen = Instant::now();
        loop {
            let deadline = silence.map(|limit| last_seen + limit);
            tokio::select! {
                () = tx.closed() => {
                    let disconnect = Frame::new(Command::Disconnect);
                    // Best effort; the socket is dropped right after
                    let _ = write.send(Message::Text(disconnect.encode().into())).await;
                    return Ok(());
                }
                _ = ticker.tick(), if outgoing > 0 => {
                    write.send(Message::Text("\n".into())).await?;
                }
                () = sleep_until(deadline.unwrap_or(last_seen)), if deadline.is_some() => {
                    return Err(NotificationError::HeartbeatTimeout(silence.unwrap_or_default()));
                }
                inbound = next_inbound(&mut read) => {
                    last_seen = Instant::now();
                    let frame = match inbound? {
                        Inbound::Frame(frame) => frame,
                        Inbound::Heartbeat => continue,
                        Inbound::Closed => return Ok(()),
                    };
                    match frame.command {
                        Command::Message => {
                            if !forward(&frame, tx).await {
                                return Ok(());
                            }
                        }
                        Command::Error => return Err(broker_error(&frame)),
                        other => debug!(command = %other, "Ignoring frame"),
                    }
                }
            }
        }
    }
}

/// Anything read from the socket; heart-beats and pings count as activity
enum Inbound {
    Frame(Frame),
    Heartbeat,
    Closed,
}

async fn next_inbound<S>(read: &mut S) -> Result<Inbound, NotificationError>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let Some(message) = read.next().await else {
        return Ok(Inbound::Closed);
    };
    Ok(match message? {
        Message::Text(text) => Frame::decode(text.as_str())?.map_or(Inbound::Heartbeat, Inbound::Frame),
        Message::Close(_) => Inbound::Closed,
        _ => Inbound::Heartbeat,
    })
}

/// Next STOMP frame, skipping heart-beats; `None` once the socket closes
async fn next_frame<S>(read: &mut S) -> Result<Option<Frame>, NotificationError>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match next_inbound(read).await? {
            Inbound::Frame(frame) => return Ok(Some(frame)),
            Inbound::Heartbeat => {}
            Inbound::Closed => return Ok(None),
        }
    }
}

/// Hand a MESSAGE body to the receiver; false once the receiver is gone
async fn forward(frame: &Frame, tx: &mpsc::Sender<AlbumNotification>) -> bool {
    match serde_json::from_str::<AlbumNotification>(&frame.body) {
        Ok(notification) => {
            debug!(kind = %notification.kind, album_id = ?notification.album_id, "Notification received");
            tx.send(notification).await.is_ok()
        }
        Err(err) => {
            warn!(error = %err, "Discarding undecodable notification");
            true
        }
    }
}

fn broker_error(frame: &Frame) -> NotificationError {
    let message = frame
        .get("message")
        .map_or_else(|| frame.body.clone(), str::to_string);
    NotificationError::Broker(message)
}

/// Value of the CONNECT `host` header
fn host_of(ws_url: &str) -> Result<String, NotificationError> {
    let url = Url::parse(ws_url)?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| NotificationError::MissingHost(ws_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_from_ws_url() {
        assert_eq!(host_of("ws://localhost:8080/ws/websocket").unwrap(), "localhost");
        assert_eq!(host_of("wss://user@catalog.example.org/ws").unwrap(), "catalog.example.org");
        assert_eq!(host_of("ws://[::1]:8080/ws").unwrap(), "[::1]");
    }

    #[test]
    fn unusable_ws_url_is_an_error() {
        assert!(matches!(host_of("not a url"), Err(NotificationError::InvalidUrl(_))));
        assert!(matches!(
            host_of("unix:/run/catalog.sock"),
            Err(NotificationError::MissingHost(_))
        ));
    }

    #[tokio::test]
    async fn run_ends_on_unusable_ws_url() {
        let config = NotificationConfig {
            ws_url: "not a url".into(),
            ..NotificationConfig::default()
        };
        let mut rx = NotificationSubscriber::new(config).spawn();
        assert!(rx.recv().await.is_none());
    }
}
