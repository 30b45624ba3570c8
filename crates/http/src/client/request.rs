//! Request and response values passed through the client pipeline
//!
//! An [`ApiRequest`] describes one logical call and never changes once built,
//! so it can be sent again after a token refresh. Each send is an
//! [`Attempt`], which carries the bearer token and whether the call was
//! already replayed.

use super::error::ClientError;
use crate::types::ApiErrorBody;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// File sent as one part of a multipart body
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
    Multipart(Vec<FilePart>),
}

/// One logical API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Set a JSON body
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append query parameters
    pub fn with_query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a file part to a multipart body
    pub fn with_file(mut self, part: FilePart) -> Self {
        match &mut self.body {
            RequestBody::Multipart(parts) => parts.push(part),
            _ => self.body = RequestBody::Multipart(vec![part]),
        }
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One send of an [`ApiRequest`]
#[derive(Debug, Clone)]
pub struct Attempt<'a> {
    pub request: &'a ApiRequest,
    /// Bearer token attached to this send
    pub token: Option<String>,
    /// Set once the call has been replayed after an authorization failure
    pub retried: bool,
}

impl<'a> Attempt<'a> {
    pub fn first(request: &'a ApiRequest, token: Option<String>) -> Self {
        Self {
            request,
            token,
            retried: false,
        }
    }

    /// The replay of this attempt with `token`
    pub fn replay(&self, token: Option<String>) -> Self {
        Self {
            request: self.request,
            token,
            retried: true,
        }
    }
}

/// Fully read response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn error_body(&self) -> ApiErrorBody {
        ApiErrorBody::from_bytes(&self.body)
    }

    /// `Ok` for success statuses, [`ClientError::Status`] otherwise
    pub fn into_result(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            Ok(self)
        } else if self.status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(self.error_body()))
        } else {
            Err(ClientError::Status {
                status: self.status.as_u16(),
                body: self.error_body(),
            })
        }
    }
}
