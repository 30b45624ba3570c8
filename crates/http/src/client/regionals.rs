//! Regional office endpoints

use super::request::ApiRequest;
use super::{CatalogClient, ClientError};
use crate::types::{ApiErrorBody, ExternalRegional, Regional, SyncResult};
use reqwest::StatusCode;
use tracing::{info, warn};

impl CatalogClient {
    pub async fn list_regionals(&self) -> Result<Vec<Regional>, ClientError> {
        self.execute(ApiRequest::get("/regionais")).await
    }

    pub async fn list_active_regionals(&self) -> Result<Vec<Regional>, ClientError> {
        self.execute(ApiRequest::get("/regionais/ativas")).await
    }

    /// Synchronize regionals with the third-party source
    ///
    /// The backend fetches the source itself. When it answers 500 (it could
    /// not reach the source) the list is fetched here and imported instead.
    /// Any other failure is returned unchanged.
    pub async fn synchronize_regionals(&self) -> Result<SyncResult, ClientError> {
        match self.execute(ApiRequest::post("/regionais/sincronizar")).await {
            Err(ClientError::Status { status, .. })
                if status == StatusCode::INTERNAL_SERVER_ERROR.as_u16() =>
            {
                warn!("Backend could not reach the regional source; importing directly");
                let regionals = self.fetch_external_regionals().await?;
                info!(count = regionals.len(), "Importing regionals");
                self.execute(ApiRequest::post("/regionais/importar").with_json(&regionals)?)
                    .await
            }
            other => other,
        }
    }

    /// Fetch the third-party regional list, without credentials
    pub async fn fetch_external_regionals(&self) -> Result<Vec<ExternalRegional>, ClientError> {
        let response = self.inner.http.get(&self.inner.regionals_url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: ApiErrorBody::from_bytes(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
