use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    data::{
        datasources::verify_receipt_datasource::{
            VerifyReceiptDatasource, VerifyReceiptDatasourceImpl,
        },
        models::verify_receipt::{
            verify_receipt_request_model::VerifyReceiptRequestModel,
            verify_receipt_response_model::{InAppModel, ReceiptModel},
        },
    },
    domain::{
        entities::{
            environment::Environment,
            receipt::{InAppPurchaseRecord, Receipt},
            receipt_status::ReceiptStatus,
            validation_result::ValidationResult,
        },
        repositories::receipt_validator::ReceiptValidator,
    },
    errors::{ConfigError, ValidationError},
};

pub(crate) struct ReceiptValidatorImpl<D: VerifyReceiptDatasource> {
    verify_receipt_datasource: D,
    primary_environment: Environment,
}

#[async_trait]
impl<D: VerifyReceiptDatasource> ReceiptValidator for ReceiptValidatorImpl<D> {
    async fn validate(&self, receipt: &[u8]) -> ValidationResult {
        let request = VerifyReceiptRequestModel::from_receipt(receipt);
        let primary = self.primary_environment;

        // A receipt answered with "wrong environment" is retried once against
        // the other endpoint. Whatever that returns is final.
        match self.verify_in(primary, &request).await {
            Err(ValidationError::Status(status))
                if status == primary.wrong_environment_status() =>
            {
                let alternate = primary.alternate();
                info!(
                    code = status.code(),
                    from = %primary,
                    to = %alternate,
                    "receipt belongs to the other environment; retrying"
                );
                self.verify_in(alternate, &request).await
            }
            result => result,
        }
    }
}

impl<D: VerifyReceiptDatasource> ReceiptValidatorImpl<D> {
    pub(crate) fn with_datasource(
        verify_receipt_datasource: D,
        primary_environment: Environment,
    ) -> Self {
        Self {
            verify_receipt_datasource,
            primary_environment,
        }
    }

    async fn verify_in(
        &self,
        environment: Environment,
        request: &VerifyReceiptRequestModel,
    ) -> ValidationResult {
        let body = self
            .verify_receipt_datasource
            .verify_receipt(environment, request)
            .await?;
        let raw: Value =
            serde_json::from_slice(&body).map_err(|e| ValidationError::InvalidResponseFormat {
                message: format!("response body is not JSON; {:?}", e),
            })?;
        let code = raw.get("status").and_then(Value::as_i64).ok_or_else(|| {
            ValidationError::InvalidResponseFormat {
                message: "response is missing a numeric status".to_owned(),
            }
        })?;
        match ReceiptStatus::classify(code) {
            ReceiptStatus::Valid => {
                let receipt = parse_receipt(&raw)?;
                debug!(
                    %environment,
                    bundle_id = %receipt.bundle_id,
                    purchases = receipt.in_app.len(),
                    "receipt validated"
                );
                Ok(receipt)
            }
            ReceiptStatus::Invalid(status) => {
                debug!(%environment, code, "receipt rejected");
                Err(status.into())
            }
        }
    }
}

impl ReceiptValidatorImpl<VerifyReceiptDatasourceImpl> {
    pub(crate) fn new(
        primary_environment: Environment,
        timeout: std::time::Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self::with_datasource(
            VerifyReceiptDatasourceImpl::new(timeout)?,
            primary_environment,
        ))
    }
}

/// Decodes the receipt out of a verifyReceipt response body.
///
/// Only a body that is not a JSON object is an error. A missing or malformed
/// `receipt` decodes to an empty receipt, and malformed purchase entries are
/// skipped.
pub(crate) fn parse_receipt(raw: &Value) -> ValidationResult {
    let object = raw
        .as_object()
        .ok_or_else(|| ValidationError::InvalidResponseFormat {
            message: "response body is not a JSON object".to_owned(),
        })?;
    let model = match object.get("receipt") {
        Some(receipt) => ReceiptModel::deserialize(receipt).unwrap_or_else(|e| {
            warn!(error = %e, "receipt field could not be decoded; using empty receipt");
            ReceiptModel::default()
        }),
        None => ReceiptModel::default(),
    };
    Ok(Receipt::from_model(model))
}

impl Receipt {
    fn from_model(m: ReceiptModel) -> Self {
        Receipt {
            bundle_id: m.bundle_id,
            app_version: m.application_version,
            original_app_version: m.original_application_version,
            expiration_date: m.expiration_date_ms.and_then(from_epoch_millis),
            in_app: m
                .in_app
                .into_iter()
                .map(InAppPurchaseRecord::from_model)
                .collect(),
        }
    }
}

impl InAppPurchaseRecord {
    fn from_model(m: InAppModel) -> Self {
        InAppPurchaseRecord {
            quantity: m.quantity,
            product_id: m.product_id,
            transaction_id: m.transaction_id,
            original_transaction_id: m.original_transaction_id,
            purchase_date: m.purchase_date_ms.and_then(from_epoch_millis),
            original_purchase_date: m.original_purchase_date_ms.and_then(from_epoch_millis),
        }
    }
}

/// Whole seconds only; sub-second precision is dropped.
fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ms / 1000, 0)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use serde_json::json;

    use super::*;
    use crate::errors::ReceiptStatusError;

    struct ScriptedDatasource {
        responses: HashMap<Environment, Result<Vec<u8>, ValidationError>>,
        calls: Mutex<Vec<Environment>>,
    }

    impl ScriptedDatasource {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn respond(mut self, environment: Environment, body: Value) -> Self {
            self.responses
                .insert(environment, Ok(serde_json::to_vec(&body).unwrap()));
            self
        }

        fn respond_raw(
            mut self,
            environment: Environment,
            response: Result<Vec<u8>, ValidationError>,
        ) -> Self {
            self.responses.insert(environment, response);
            self
        }
    }

    #[async_trait]
    impl VerifyReceiptDatasource for ScriptedDatasource {
        async fn verify_receipt(
            &self,
            environment: Environment,
            _request: &VerifyReceiptRequestModel,
        ) -> Result<Vec<u8>, ValidationError> {
            self.calls.lock().unwrap().push(environment);
            self.responses
                .get(&environment)
                .cloned()
                .unwrap_or_else(|| panic!("unexpected call to {environment}"))
        }
    }

    fn valid_body(product_ids: &[&str]) -> Value {
        let in_app: Vec<Value> = product_ids
            .iter()
            .enumerate()
            .map(|(i, product_id)| {
                json!({
                    "quantity": "1",
                    "product_id": product_id,
                    "transaction_id": format!("10000000{i}"),
                    "original_transaction_id": format!("10000000{i}"),
                    "purchase_date_ms": "1700000000123",
                    "original_purchase_date_ms": "1700000000123",
                })
            })
            .collect();
        json!({
            "status": 0,
            "environment": "Production",
            "receipt": {
                "bundle_id": "com.app",
                "application_version": "42",
                "original_application_version": "1.0",
                "in_app": in_app,
            },
        })
    }

    fn validator(datasource: ScriptedDatasource) -> ReceiptValidatorImpl<ScriptedDatasource> {
        ReceiptValidatorImpl::with_datasource(datasource, Environment::Production)
    }

    #[tokio::test]
    async fn valid_status_decodes_receipt() {
        let v = validator(
            ScriptedDatasource::new()
                .respond(Environment::Production, valid_body(&["com.app.pro"])),
        );
        let receipt = v.validate(b"receipt").await.unwrap();
        assert_eq!(receipt.bundle_id, "com.app");
        assert_eq!(receipt.app_version, "42");
        assert_eq!(receipt.original_app_version, "1.0");
        assert_eq!(receipt.in_app.len(), 1);
        let purchase = &receipt.in_app[0];
        assert_eq!(purchase.quantity, 1);
        assert_eq!(purchase.product_id, "com.app.pro");
        assert_eq!(
            purchase.purchase_date,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[tokio::test]
    async fn rejected_status_is_classified() {
        let v = validator(
            ScriptedDatasource::new().respond(Environment::Production, json!({ "status": 21003 })),
        );
        assert_eq!(
            v.validate(b"receipt").await,
            Err(ValidationError::Status(ReceiptStatusError::NotAuthenticated))
        );
    }

    #[tokio::test]
    async fn sandbox_receipt_is_retried_against_sandbox() {
        let datasource = ScriptedDatasource::new()
            .respond(Environment::Production, json!({ "status": 21007 }))
            .respond(Environment::Sandbox, valid_body(&["com.app.pro"]));
        let v = validator(datasource);
        assert!(v.validate(b"receipt").await.is_ok());
        assert_eq!(
            *v.verify_receipt_datasource.calls.lock().unwrap(),
            vec![Environment::Production, Environment::Sandbox]
        );
    }

    #[tokio::test]
    async fn production_receipt_is_retried_against_production_when_sandbox_is_primary() {
        let datasource = ScriptedDatasource::new()
            .respond(Environment::Sandbox, json!({ "status": 21008 }))
            .respond(Environment::Production, valid_body(&["com.app.pro"]));
        let v = ReceiptValidatorImpl::with_datasource(datasource, Environment::Sandbox);
        assert!(v.validate(b"receipt").await.is_ok());
    }

    #[tokio::test]
    async fn environment_retry_happens_only_once() {
        let datasource = ScriptedDatasource::new()
            .respond(Environment::Production, json!({ "status": 21007 }))
            .respond(Environment::Sandbox, json!({ "status": 21008 }));
        let v = validator(datasource);
        assert_eq!(
            v.validate(b"receipt").await,
            Err(ValidationError::Status(
                ReceiptStatusError::ProductionReceiptSentToSandbox
            ))
        );
        assert_eq!(v.verify_receipt_datasource.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let v = validator(
            ScriptedDatasource::new().respond(Environment::Production, json!({ "status": 21005 })),
        );
        assert!(v.validate(b"receipt").await.is_err());
        assert_eq!(v.verify_receipt_datasource.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_network_error() {
        let error = ValidationError::Network {
            message: "timed out".to_owned(),
        };
        let v = validator(
            ScriptedDatasource::new().respond_raw(Environment::Production, Err(error.clone())),
        );
        assert_eq!(v.validate(b"receipt").await, Err(error));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response_format() {
        let v = validator(ScriptedDatasource::new().respond_raw(
            Environment::Production,
            Ok(b"<html>502 Bad Gateway</html>".to_vec()),
        ));
        assert!(matches!(
            v.validate(b"receipt").await,
            Err(ValidationError::InvalidResponseFormat { .. })
        ));
    }

    #[tokio::test]
    async fn missing_status_is_invalid_response_format() {
        for body in [json!({ "receipt": {} }), json!({ "status": "0" }), json!([0])] {
            let v = validator(ScriptedDatasource::new().respond(Environment::Production, body));
            assert!(matches!(
                v.validate(b"receipt").await,
                Err(ValidationError::InvalidResponseFormat { .. })
            ));
        }
    }

    #[tokio::test]
    async fn deep_check_requires_product_in_receipt() {
        let v = validator(
            ScriptedDatasource::new()
                .respond(Environment::Production, valid_body(&["com.app.pro"])),
        );
        assert!(v.validate_purchase(b"receipt", "com.app.pro").await.is_ok());
        assert_eq!(
            v.validate_purchase(b"receipt", "com.app.coins").await,
            Err(ValidationError::PurchaseNotFoundInReceipt {
                product_id: "com.app.coins".to_owned()
            })
        );
    }

    #[test]
    fn parse_rejects_non_object() {
        assert!(matches!(
            parse_receipt(&json!("status")),
            Err(ValidationError::InvalidResponseFormat { .. })
        ));
    }

    #[test]
    fn missing_fields_decode_to_defaults() {
        let receipt = parse_receipt(&json!({
            "status": 0,
            "receipt": { "in_app": [{}] },
        }))
        .unwrap();
        assert_eq!(receipt.bundle_id, "");
        assert_eq!(receipt.app_version, "");
        assert_eq!(receipt.original_app_version, "");
        assert_eq!(receipt.expiration_date, None);
        assert_eq!(receipt.in_app, vec![InAppPurchaseRecord::default()]);

        let empty = parse_receipt(&json!({ "status": 0 })).unwrap();
        assert_eq!(empty, Receipt::default());
    }

    #[test]
    fn malformed_fields_decode_to_defaults() {
        let receipt = parse_receipt(&json!({
            "status": 0,
            "receipt": {
                "bundle_id": 17,
                "application_version": "3",
                "expiration_date_ms": "soon",
                "in_app": [{
                    "quantity": "many",
                    "product_id": "com.app.pro",
                    "transaction_id": ["1"],
                    "purchase_date_ms": 1700000000999i64,
                }],
            },
        }))
        .unwrap();
        assert_eq!(receipt.bundle_id, "");
        assert_eq!(receipt.app_version, "3");
        assert_eq!(receipt.expiration_date, None);
        let purchase = &receipt.in_app[0];
        assert_eq!(purchase.quantity, 0);
        assert_eq!(purchase.product_id, "com.app.pro");
        assert_eq!(purchase.transaction_id, "");
        assert_eq!(
            purchase.purchase_date,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(purchase.original_purchase_date, None);
    }

    #[test]
    fn malformed_purchase_entries_do_not_abort_the_rest() {
        let receipt = parse_receipt(&json!({
            "status": 0,
            "receipt": {
                "in_app": [
                    "garbage",
                    { "product_id": "com.app.a" },
                    42,
                    { "product_id": "com.app.b" },
                ],
            },
        }))
        .unwrap();
        assert!(receipt.contains_purchase("com.app.a"));
        assert!(receipt.contains_purchase("com.app.b"));
        assert_eq!(receipt.in_app.len(), 2);
    }

    #[test]
    fn expiration_date_is_decoded() {
        let receipt = parse_receipt(&json!({
            "status": 0,
            "receipt": { "expiration_date_ms": "1800000000000" },
        }))
        .unwrap();
        assert_eq!(
            receipt.expiration_date,
            DateTime::from_timestamp(1_800_000_000, 0)
        );
    }
}
