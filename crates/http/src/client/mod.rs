//! Catalog HTTP client
//!
//! Every call goes through [`CatalogClient::request`], which attaches the
//! stored access token and recovers from expired sessions: the first
//! authorization failure triggers one refresh exchange shared by every
//! request that fails while it runs, after which each of them is replayed
//! once with the new token.

pub mod albums;
pub mod artists;
pub mod auth;
pub mod error;
pub mod refresh;
pub mod regionals;
pub mod request;
pub mod session;
pub mod storage;

use catalog_core::{AuthConfig, CatalogConfig};
use error::{ClientError, RefreshError};
use refresh::{RefreshCoordinator, RefreshLead, Ticket};
use request::{ApiRequest, ApiResponse, Attempt, FilePart, RequestBody};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use session::{SessionEndReason, SessionSignal, SessionState};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use storage::{CredentialStore, Credentials, MemoryStore};
use tracing::{debug, info, warn};

use crate::types::Envelope;

/// Catalog API client
///
/// Cheap to clone; clones share credentials, the refresh coordinator, and
/// the session signal.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: String,
    auth: AuthConfig,
    credentials: Credentials,
    /// Token attached when storage has none, updated on login and refresh
    default_token: RwLock<Option<String>>,
    refresh: RefreshCoordinator,
    session: SessionSignal,
    regionals_url: String,
}

impl CatalogClient {
    /// Create a client with in-memory credentials
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    pub fn session(&self) -> &SessionSignal {
        &self.inner.session
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.inner.auth
    }

    /// Whether a refresh exchange is in flight
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Send a request, refreshing the session once if it has expired
    ///
    /// Success statuses resolve to the response; other statuses become
    /// [`ClientError::Status`], except authorization failures that could
    /// not be recovered, which become [`ClientError::Unauthorized`] or
    /// [`ClientError::RefreshFailed`].
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let attempt = Attempt::first(&request, self.current_token()?);
        let response = self.send(&attempt).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return response.into_result();
        }
        self.recover(&attempt, &response).await
    }

    /// Send a request and decode the JSON payload, unwrapping the success
    /// envelope when present
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.request(request).await?;
        Ok(response.json::<Envelope<T>>()?.into_inner())
    }

    /// Send a request without credentials or session recovery
    pub async fn request_public(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let attempt = Attempt::first(&request, None);
        self.send(&attempt).await?.into_result()
    }

    /// Send a request whose response body is not needed
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), ClientError> {
        self.request(request).await.map(|_| ())
    }

    async fn recover(
        &self,
        attempt: &Attempt<'_>,
        rejected: &ApiResponse,
    ) -> Result<ApiResponse, ClientError> {
        if attempt.retried {
            return Err(ClientError::Unauthorized(rejected.error_body()));
        }

        // A refresh settled while this attempt was in flight
        let current = self.current_token()?;
        if current.is_some() && current != attempt.token {
            debug!(path = %attempt.request.path, "Replaying with the refreshed token");
            return self.replay(attempt, current).await;
        }

        let token = match self.inner.refresh.begin() {
            Ticket::Follower(waiter) => {
                debug!(path = %attempt.request.path, "Waiting for token refresh in flight");
                waiter.wait().await?
            }
            Ticket::Leader(lead, waiter) => {
                self.spawn_refresh(lead);
                match waiter.wait().await {
                    Err(RefreshError::MissingRefreshToken) => {
                        return Err(ClientError::Unauthorized(rejected.error_body()));
                    }
                    outcome => outcome?,
                }
            }
        };
        self.replay(attempt, Some(token)).await
    }

    async fn replay(
        &self,
        attempt: &Attempt<'_>,
        token: Option<String>,
    ) -> Result<ApiResponse, ClientError> {
        let replay = attempt.replay(token);
        self.send(&replay).await?.into_result()
    }

    /// Run the exchange on its own task; it settles the cycle even when the
    /// request that opened it is cancelled
    fn spawn_refresh(&self, lead: RefreshLead) {
        let client = self.clone();
        let task = async move { client.run_refresh(lead).await };

        #[cfg(not(target_arch = "wasm32"))]
        tokio::spawn(task);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }

    async fn run_refresh(&self, lead: RefreshLead) {
        let refresh_token = match self.inner.credentials.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Session expired and no refresh token is stored");
                self.end_session(SessionEndReason::MissingRefreshToken);
                lead.fail(RefreshError::MissingRefreshToken);
                return;
            }
            Err(err) => return self.abort_refresh(lead, RefreshError::Storage(err.to_string())),
        };

        info!("Refreshing access token");
        let pair = match self.exchange_refresh_token(&refresh_token).await {
            Ok(pair) => pair,
            Err(err) => return self.abort_refresh(lead, err),
        };
        if let Err(err) = self.inner.credentials.save(&pair) {
            return self.abort_refresh(lead, RefreshError::Storage(err.to_string()));
        }

        self.set_default_token(Some(pair.token.clone()));
        let waiters = lead.succeed(&pair.token);
        info!(waiters, "Access token refreshed");
    }

    /// Session is cleared and the shell notified before any waiter resumes
    fn abort_refresh(&self, lead: RefreshLead, err: RefreshError) {
        warn!(error = %err, "Token refresh failed");
        self.end_session(SessionEndReason::RefreshFailed(err.to_string()));
        let waiters = lead.fail(err);
        debug!(waiters, "Rejected requests waiting on the refresh");
    }

    /// Drop every credential and tell the shell to show the login entry point
    fn end_session(&self, reason: SessionEndReason) {
        if let Err(err) = self.inner.credentials.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
        self.set_default_token(None);
        info!(%reason, "Session cleared");
        self.inner.session.require_login(reason);
    }

    fn current_token(&self) -> Result<Option<String>, ClientError> {
        if let Some(token) = self.inner.credentials.access_token()? {
            return Ok(Some(token));
        }
        Ok(self
            .inner
            .default_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_default_token(&self, token: Option<String>) {
        *self
            .inner
            .default_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    async fn send(&self, attempt: &Attempt<'_>) -> Result<ApiResponse, ClientError> {
        let request = attempt.request;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &attempt.token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        debug!(
            method = %request.method,
            path = %request.path,
            retried = attempt.retried,
            "Sending request"
        );
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), path = %request.path, "Received response");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Forms are consumed on send, so each attempt builds its own
fn multipart_form(parts: &[FilePart]) -> Result<reqwest::multipart::Form, ClientError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let file = reqwest::multipart::Part::bytes(part.bytes.to_vec())
            .file_name(part.file_name.clone())
            .mime_str(&part.content_type)?;
        form = form.part(part.field.clone(), file);
    }
    Ok(form)
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Builder for CatalogClient
#[derive(Default)]
pub struct CatalogClientBuilder {
    base_url: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    auth: Option<AuthConfig>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    regionals_url: Option<String>,
}

impl CatalogClientBuilder {
    /// Builder populated from loaded configuration
    pub fn from_config(config: &CatalogConfig, store: Arc<dyn CredentialStore>) -> Self {
        let mut builder = Self::default()
            .base_url(config.api.base_url.clone())
            .store(store)
            .auth(config.auth.clone())
            .user_agent(config.api.user_agent.clone())
            .regionals_url(config.regionals.external_url.clone());
        if config.api.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.api.timeout_secs));
        }
        builder
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the credential store (in-memory by default)
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set auth endpoints and storage keys
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the third-party regional source used when backend sync fails
    pub fn regionals_url(mut self, url: impl Into<String>) -> Self {
        self.regionals_url = Some(url.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<CatalogClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("catalog-client/{}", env!("CARGO_PKG_VERSION")));
        client_builder = client_builder.user_agent(user_agent);

        let http = client_builder.build()?;

        let auth = self.auth.unwrap_or_default();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let credentials = Credentials::new(store, &auth);
        let initial = if credentials.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        let session = SessionSignal::new(initial, auth.login_route.clone());
        let regionals_url = self
            .regionals_url
            .unwrap_or_else(|| catalog_core::RegionalConfig::default().external_url);

        Ok(CatalogClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                auth,
                credentials,
                default_token: RwLock::new(None),
                refresh: RefreshCoordinator::new(),
                session,
                regionals_url,
            }),
        })
    }
}
