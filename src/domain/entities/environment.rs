use std::{fmt, str::FromStr};

use crate::{
    constants::{PRODUCTION_VERIFY_RECEIPT_URL, SANDBOX_VERIFY_RECEIPT_URL},
    errors::{ConfigError, ReceiptStatusError},
};

/// The receipt service environment a receipt is verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn verify_receipt_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_VERIFY_RECEIPT_URL,
            Environment::Sandbox => SANDBOX_VERIFY_RECEIPT_URL,
        }
    }

    pub fn alternate(self) -> Self {
        match self {
            Environment::Production => Environment::Sandbox,
            Environment::Sandbox => Environment::Production,
        }
    }

    /// The status this environment answers with when handed a receipt that
    /// was issued by the other one.
    pub(crate) fn wrong_environment_status(self) -> ReceiptStatusError {
        match self {
            Environment::Production => ReceiptStatusError::SandboxReceiptSentToProduction,
            Environment::Sandbox => ReceiptStatusError::ProductionReceiptSentToSandbox,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => f.write_str("production"),
            Environment::Sandbox => f.write_str("sandbox"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            _ => Err(ConfigError::InvalidValue {
                key: crate::constants::ENV_ENVIRONMENT,
                value: s.to_owned(),
            }),
        }
    }
}
