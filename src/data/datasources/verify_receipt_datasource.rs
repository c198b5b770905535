use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    data::models::verify_receipt::verify_receipt_request_model::VerifyReceiptRequestModel,
    domain::entities::environment::Environment,
    errors::{ConfigError, ValidationError},
};

#[async_trait]
pub(crate) trait VerifyReceiptDatasource: Send + Sync + 'static {
    /// verifyReceipt:
    /// https://developer.apple.com/documentation/appstorereceipts/verifyreceipt
    ///
    /// Returns the raw response body; interpreting it is left to the caller.
    async fn verify_receipt(
        &self,
        environment: Environment,
        request: &VerifyReceiptRequestModel,
    ) -> Result<Vec<u8>, ValidationError>;
}

pub(crate) struct VerifyReceiptDatasourceImpl {
    client: reqwest::Client,
    production_url: String,
    sandbox_url: String,
}

#[async_trait]
impl VerifyReceiptDatasource for VerifyReceiptDatasourceImpl {
    async fn verify_receipt(
        &self,
        environment: Environment,
        request: &VerifyReceiptRequestModel,
    ) -> Result<Vec<u8>, ValidationError> {
        let url = match environment {
            Environment::Production => &self.production_url,
            Environment::Sandbox => &self.sandbox_url,
        };
        debug!(%environment, url, "calling verifyReceipt");
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ValidationError::Network {
                message: format!("callout failed to send; {:?}", e),
            })?;

        // Error pages are still handed to the parser, which rejects anything
        // that is not a verifyReceipt payload.
        let status = response.status();
        if !status.is_success() {
            warn!(%environment, %status, "verifyReceipt returned an error status");
        }

        let body = response.bytes().await.map_err(|e| ValidationError::Network {
            message: format!("failed to read callout response; {:?}", e),
        })?;
        Ok(body.to_vec())
    }
}

impl VerifyReceiptDatasourceImpl {
    /// Requests that do not complete within `timeout` fail with
    /// `ValidationError::Network`.
    pub(crate) fn new(timeout: Duration) -> Result<Self, ConfigError> {
        Self::with_endpoints(
            timeout,
            Environment::Production.verify_receipt_url(),
            Environment::Sandbox.verify_receipt_url(),
        )
    }

    pub(crate) fn with_endpoints(
        timeout: Duration,
        production_url: &str,
        sandbox_url: &str,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: format!("{:?}", e),
            })?;
        Ok(Self {
            client,
            production_url: production_url.to_owned(),
            sandbox_url: sandbox_url.to_owned(),
        })
    }
}
