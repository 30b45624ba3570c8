//! Live album notifications over STOMP
//!
//! The backend publishes a message on the album topic whenever an album is
//! created. Messages are decoded into [`AlbumNotification`] and handed over
//! as-is; presenting them is up to the shell.
//!
//! [`AlbumNotification`]: crate::types::AlbumNotification

pub mod frame;
#[cfg(not(target_arch = "wasm32"))]
pub mod subscriber;

pub use frame::{Command, Frame};
#[cfg(not(target_arch = "wasm32"))]
pub use subscriber::NotificationSubscriber;

use thiserror::Error;

/// Notification channel errors
#[derive(Debug, Error)]
pub enum NotificationError {
    #[cfg(not(target_arch = "wasm32"))]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Malformed STOMP frame: {0}")]
    Frame(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Connection closed before the session was established")]
    Closed,

    #[error("No heart-beat from the broker within {0:?}")]
    HeartbeatTimeout(std::time::Duration),

    #[error("Invalid notification URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Notification URL has no host: {0}")]
    MissingHost(String),
}
