//! Authentication API client methods

use super::error::RefreshError;
use super::request::ApiRequest;
use super::{CatalogClient, ClientError};
use crate::types::{
    ApiErrorBody, AuthResponse, Envelope, LoginRequest, RegisterRequest, TokenPair,
};
use tracing::{debug, info, warn};

impl CatalogClient {
    /// Log in and persist the issued credentials
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let path = self.inner.auth.login_path.clone();
        let response: AuthResponse = self
            .request_public(ApiRequest::post(path).with_json(request)?)
            .await?
            .json::<Envelope<AuthResponse>>()?
            .into_inner();
        self.store_session(&response)?;
        info!(username = %request.username, "Logged in");
        Ok(response)
    }

    /// Register an account; the backend logs the new user in
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let path = self.inner.auth.register_path.clone();
        let response: AuthResponse = self
            .request_public(ApiRequest::post(path).with_json(request)?)
            .await?
            .json::<Envelope<AuthResponse>>()?
            .into_inner();
        self.store_session(&response)?;
        info!(username = %request.username, "Registered");
        Ok(response)
    }

    /// Forget stored credentials
    pub fn logout(&self) -> Result<(), ClientError> {
        self.inner.credentials.clear()?;
        self.set_default_token(None);
        self.inner.session.anonymous();
        info!("Logged out");
        Ok(())
    }

    fn store_session(&self, response: &AuthResponse) -> Result<(), ClientError> {
        match &response.refresh_token {
            Some(refresh_token) => self.inner.credentials.save(&TokenPair {
                token: response.token.clone(),
                refresh_token: refresh_token.clone(),
            })?,
            None => {
                warn!("Login response carried no refresh token; session cannot be renewed");
                self.inner.credentials.save_access_token(&response.token)?;
            }
        }
        self.set_default_token(Some(response.token.clone()));
        self.inner.session.authenticated();
        Ok(())
    }

    /// Exchange a refresh token for a new credential pair
    ///
    /// Sent outside the request pipeline: a failed exchange never triggers
    /// another refresh.
    pub(crate) async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenPair, RefreshError> {
        let url = self.url(&self.inner.auth.refresh_path);
        debug!(path = %self.inner.auth.refresh_path, "Sending refresh exchange");

        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: ApiErrorBody::from_bytes(&body).to_string(),
            });
        }

        serde_json::from_slice::<Envelope<TokenPair>>(&body)
            .map(Envelope::into_inner)
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))
    }
}
