//! Observable list state for catalog views
//!
//! A [`ListStore`] holds the last loaded page of a listing together with its
//! loading flag and error message. Views subscribe to snapshots and never
//! talk to the client directly.

use crate::client::albums::AlbumQuery;
use crate::client::artists::ArtistQuery;
use crate::client::CatalogClient;
use crate::client::error::ClientError;
use crate::types::{Album, Artist};
use catalog_core::Page;
use std::future::Future;
use tokio::sync::watch;
use tracing::debug;

/// State of a listing at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub loading: bool,
    /// Message of the last failed load
    pub error: Option<String>,
    pub total_pages: u32,
    pub current_page: u32,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            total_pages: 0,
            current_page: 0,
        }
    }
}

/// Listing state shared with any number of subscribers
#[derive(Debug)]
pub struct ListStore<T> {
    state: watch::Sender<ListSnapshot<T>>,
    /// Shown when a load fails without a server message
    fallback_error: String,
}

impl<T: Clone> ListStore<T> {
    pub fn new(fallback_error: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ListSnapshot::default());
        Self {
            state,
            fallback_error: fallback_error.into(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    /// Replace the listing with the page `fetch` resolves to
    ///
    /// On failure the listing is emptied and the error message recorded.
    /// The loading flag is cleared either way.
    pub async fn load<F>(&self, fetch: F) -> Result<(), ClientError>
    where
        F: Future<Output = Result<Page<T>, ClientError>>,
    {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = fetch.await;
        let fallback = &self.fallback_error;
        self.state.send_modify(|s| {
            s.loading = false;
            match &result {
                Ok(page) => {
                    s.items.clone_from(&page.content);
                    s.total_pages = page.total_pages;
                    s.current_page = page.number;
                }
                Err(err) => {
                    s.items.clear();
                    s.error = Some(err.user_message(fallback));
                }
            }
        });

        result.map(|page| debug!(items = page.content.len(), "Listing loaded"))
    }

    /// Put an item at the top of the listing
    pub fn add(&self, item: T) {
        self.state.send_modify(|s| s.items.insert(0, item));
    }

    /// Drop every item matching `predicate`
    pub fn remove_where<P>(&self, mut predicate: P)
    where
        P: FnMut(&T) -> bool,
    {
        self.state.send_modify(|s| s.items.retain(|item| !predicate(item)));
    }

    /// Reset to an empty listing
    pub fn clear(&self) {
        self.state.send_modify(|s| {
            s.items.clear();
            s.total_pages = 0;
            s.current_page = 0;
            s.error = None;
        });
    }
}

/// Artist listing
#[derive(Debug)]
pub struct ArtistStore {
    list: ListStore<Artist>,
}

impl Default for ArtistStore {
    fn default() -> Self {
        Self {
            list: ListStore::new("Erro ao carregar artistas"),
        }
    }
}

impl ArtistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, client: &CatalogClient, query: &ArtistQuery) -> Result<(), ClientError> {
        self.list.load(client.list_artists(query)).await
    }

    pub fn remove(&self, id: i64) {
        self.list.remove_where(|artist| artist.id == id);
    }
}

impl std::ops::Deref for ArtistStore {
    type Target = ListStore<Artist>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

/// Album listing
#[derive(Debug)]
pub struct AlbumStore {
    list: ListStore<Album>,
}

impl Default for AlbumStore {
    fn default() -> Self {
        Self {
            list: ListStore::new("Erro ao carregar álbuns"),
        }
    }
}

impl AlbumStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, client: &CatalogClient, query: &AlbumQuery) -> Result<(), ClientError> {
        self.list.load(client.list_albums(query)).await
    }

    pub fn remove(&self, id: i64) {
        self.list.remove_where(|album| album.id == id);
    }
}

impl std::ops::Deref for AlbumStore {
    type Target = ListStore<Album>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}
