//! Artist endpoints

use super::request::ApiRequest;
use super::{CatalogClient, ClientError};
use crate::types::{Artist, ArtistRequest};
use catalog_core::{Page, PageRequest};

/// Artist listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistQuery {
    pub page: PageRequest,
    /// Case-insensitive name filter
    pub name: Option<String>,
}

impl Default for ArtistQuery {
    fn default() -> Self {
        Self {
            page: PageRequest::first("name"),
            name: None,
        }
    }
}

impl ArtistQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = self.page.to_query();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            query.push(("name".to_string(), name.to_string()));
        }
        query
    }
}

impl CatalogClient {
    /// List artists
    pub async fn list_artists(&self, query: &ArtistQuery) -> Result<Page<Artist>, ClientError> {
        self.execute(ApiRequest::get("/artists").with_query(query.to_query()))
            .await
    }

    pub async fn get_artist(&self, id: i64) -> Result<Artist, ClientError> {
        self.execute(ApiRequest::get(format!("/artists/{id}"))).await
    }

    pub async fn create_artist(&self, artist: &ArtistRequest) -> Result<Artist, ClientError> {
        self.execute(ApiRequest::post("/artists").with_json(artist)?)
            .await
    }

    pub async fn update_artist(
        &self,
        id: i64,
        artist: &ArtistRequest,
    ) -> Result<Artist, ClientError> {
        self.execute(ApiRequest::put(format!("/artists/{id}")).with_json(artist)?)
            .await
    }

    pub async fn delete_artist(&self, id: i64) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete(format!("/artists/{id}")))
            .await
    }
}
