//! Wire types exchanged with the catalog API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Access and refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Tokens issued on login or registration
///
/// Older backends hand out only an access token, so the refresh token is
/// optional here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,
}

/// Success envelope `{ status, message, data, path }` some endpoints wrap
/// their payload in; bare payloads are accepted too
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped {
        data: T,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data, .. } | Self::Bare(data) => data,
        }
    }
}

/// Error body returned by the backend
///
/// Every field is optional: proxies and servlet containers answer with
/// plain text or partial JSON. The raw text is kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<String>>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(skip)]
    pub raw: String,
}

impl ApiErrorBody {
    /// Parse a response body, tolerating non-JSON content
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(bytes).into_owned();
        match serde_json::from_slice::<Self>(bytes) {
            Ok(body) => Self { raw, ..body },
            Err(_) => Self {
                raw,
                ..Self::default()
            },
        }
    }

    /// Most specific human-readable message available
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.messages.as_ref().and_then(|m| m.first()).map(String::as_str))
            .or(self.error.as_deref())
            .or_else(|| {
                let raw = self.raw.trim();
                (!raw.is_empty()).then_some(raw)
            })
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("no details"))
    }
}

/// Artist as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub albums_count: u32,
}

/// Artist create/update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRequest {
    pub name: String,
}

/// Artist reference embedded in an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumArtist {
    pub id: i64,
    pub name: String,
}

/// Album as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist: AlbumArtist,
}

/// Album create/update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRequest {
    pub title: String,
    pub artist_id: i64,
}

/// Pre-signed location of an album cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverUrl {
    pub url: String,
}

/// Regional office known to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regional {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "ativo")]
    pub active: bool,
}

/// Regional office as published by the third-party source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRegional {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
}

/// Outcome of a regional synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    #[serde(rename = "inseridos", default)]
    pub inserted: u32,
    #[serde(rename = "atualizados", default)]
    pub updated: u32,
    #[serde(rename = "inativados", default)]
    pub deactivated: u32,
    #[serde(rename = "mensagem", default)]
    pub message: String,
}

/// Notification pushed on the album topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumNotification {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub album_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AlbumNotification {
    /// Kind sent when an album is added
    pub const NEW_ALBUM: &'static str = "NEW_ALBUM";

    /// When the backend emitted the notification
    pub fn sent_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.timestamp
            .and_then(chrono::DateTime::from_timestamp_millis)
    }
}
