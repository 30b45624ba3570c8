//! Album endpoints, including cover upload

use super::request::{ApiRequest, FilePart};
use super::{CatalogClient, ClientError};
use crate::types::{Album, AlbumRequest, CoverUrl};
use bytes::Bytes;
use catalog_core::{Page, PageRequest};

/// Album listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumQuery {
    pub page: PageRequest,
    /// Artist name filter, sent as `artist`
    pub artist_name: Option<String>,
}

impl Default for AlbumQuery {
    fn default() -> Self {
        Self {
            page: PageRequest::first("title"),
            artist_name: None,
        }
    }
}

impl AlbumQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = self.page.to_query();
        if let Some(artist) = self.artist_name.as_deref().filter(|n| !n.is_empty()) {
            query.push(("artist".to_string(), artist.to_string()));
        }
        query
    }
}

/// Cover image to upload
#[derive(Debug, Clone)]
pub struct CoverFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl CoverFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a cover from disk, guessing the content type from the extension
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "cover".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = guess_content_type(&file_name);
        Ok(Self::new(file_name, content_type, Bytes::from(bytes)))
    }

    fn into_part(self) -> FilePart {
        FilePart {
            field: "file".to_string(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

impl CatalogClient {
    /// List albums
    pub async fn list_albums(&self, query: &AlbumQuery) -> Result<Page<Album>, ClientError> {
        self.execute(ApiRequest::get("/albums").with_query(query.to_query()))
            .await
    }

    pub async fn get_album(&self, id: i64) -> Result<Album, ClientError> {
        self.execute(ApiRequest::get(format!("/albums/{id}"))).await
    }

    pub async fn create_album(&self, album: &AlbumRequest) -> Result<Album, ClientError> {
        self.execute(ApiRequest::post("/albums").with_json(album)?)
            .await
    }

    pub async fn update_album(&self, id: i64, album: &AlbumRequest) -> Result<Album, ClientError> {
        self.execute(ApiRequest::put(format!("/albums/{id}")).with_json(album)?)
            .await
    }

    pub async fn delete_album(&self, id: i64) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::delete(format!("/albums/{id}")))
            .await
    }

    /// Upload an album cover as multipart field `file`
    pub async fn upload_cover(&self, id: i64, cover: CoverFile) -> Result<(), ClientError> {
        let request = ApiRequest::post(format!("/albums/{id}/cover")).with_file(cover.into_part());
        self.execute_empty(request).await
    }

    /// Temporary URL of an album cover
    pub async fn cover_url(&self, id: i64) -> Result<CoverUrl, ClientError> {
        self.execute(ApiRequest::get(format!("/albums/{id}/cover-url")))
            .await
    }
}
