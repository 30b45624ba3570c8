//! Catalog HTTP client
//!
//! Authenticated access to the catalog API: stored credentials, a shared
//! token refresh on expired sessions, typed artist/album/regional endpoints,
//! observable listing state, and the live album notification channel.

pub mod types;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod store;

#[cfg(feature = "notifications")]
pub mod notifications;

#[cfg(feature = "client")]
pub use client::{
    CatalogClient, CatalogClientBuilder,
    error::{ClientError, RefreshError},
    session::{LoginRequired, SessionEndReason, SessionState},
    storage::{CredentialStore, Credentials, MemoryStore, StorageError},
};
#[cfg(all(feature = "client", not(target_arch = "wasm32")))]
pub use client::storage::FileStore;
#[cfg(all(feature = "client", target_arch = "wasm32"))]
pub use client::storage::LocalStorageStore;
#[cfg(feature = "client")]
pub use store::{AlbumStore, ArtistStore, ListSnapshot, ListStore};

pub use catalog_core::{Page, PageRequest, SortOrder};
