use std::{env, path::PathBuf, time::Duration};

use crate::{
    constants::{
        DEFAULT_ENTITLEMENTS_PATH, DEFAULT_RECEIPT_PATH, DEFAULT_REQUEST_TIMEOUT_SECS,
        ENV_ENTITLEMENTS_PATH, ENV_ENVIRONMENT, ENV_PRODUCT_IDS, ENV_RECEIPT_PATH,
        ENV_TIMEOUT_SECS, ENV_VALIDATE_RESTORES,
    },
    domain::entities::environment::Environment,
    errors::ConfigError,
};

#[derive(Debug, Clone)]
pub struct StoreKitConfig {
    /// Environment tried first when verifying receipts. The other one is
    /// tried once if the receipt service reports the receipt belongs there.
    pub environment: Environment,
    /// Upper bound on a single verifyReceipt callout.
    pub request_timeout: Duration,
    /// Whether restored transactions go through the same receipt check as
    /// purchases before being recorded.
    pub validate_restored_transactions: bool,
    pub receipt_path: PathBuf,
    pub entitlements_path: PathBuf,
    /// Products offered by the app, used for catalog lookups.
    pub product_ids: Vec<String>,
}

impl Default for StoreKitConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            validate_restored_transactions: true,
            receipt_path: PathBuf::from(DEFAULT_RECEIPT_PATH),
            entitlements_path: PathBuf::from(DEFAULT_ENTITLEMENTS_PATH),
            product_ids: Vec::new(),
        }
    }
}

impl StoreKitConfig {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file if one is present. Unset keys keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_ENVIRONMENT) {
            config.environment = value.parse()?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = value
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_TIMEOUT_SECS,
                    value: value.clone(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup(ENV_VALIDATE_RESTORES) {
            config.validate_restored_transactions = parse_bool(ENV_VALIDATE_RESTORES, &value)?;
        }
        if let Some(value) = lookup(ENV_RECEIPT_PATH) {
            config.receipt_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_ENTITLEMENTS_PATH) {
            config.entitlements_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_PRODUCT_IDS) {
            config.product_ids = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        }),
    }
}
