use crate::errors::ReceiptStatusError;

/// Classified outcome of a verifyReceipt `status` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Valid,
    Invalid(ReceiptStatusError),
}

impl ReceiptStatus {
    /// Total over every integer: undocumented codes map to
    /// `ReceiptStatusError::Unknown` carrying the original value.
    pub fn classify(code: i64) -> Self {
        let error = match code {
            0 => return ReceiptStatus::Valid,
            21000 => ReceiptStatusError::MalformedJson,
            21002 => ReceiptStatusError::MalformedReceiptData,
            21003 => ReceiptStatusError::NotAuthenticated,
            21004 => ReceiptStatusError::SharedSecretMismatch,
            21005 => ReceiptStatusError::ServerUnavailable,
            21006 => ReceiptStatusError::SubscriptionExpired,
            21007 => ReceiptStatusError::SandboxReceiptSentToProduction,
            21008 => ReceiptStatusError::ProductionReceiptSentToSandbox,
            other => ReceiptStatusError::Unknown(other),
        };
        ReceiptStatus::Invalid(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        assert_eq!(ReceiptStatus::classify(0), ReceiptStatus::Valid);
    }

    #[test]
    fn documented_codes_map_to_distinct_errors() {
        let codes = [21000, 21002, 21003, 21004, 21005, 21006, 21007, 21008];
        let mut seen = Vec::new();
        for code in codes {
            let ReceiptStatus::Invalid(error) = ReceiptStatus::classify(code) else {
                panic!("{code} classified as valid");
            };
            assert!(!matches!(error, ReceiptStatusError::Unknown(_)), "{code}");
            assert_eq!(error.code(), code);
            assert!(!seen.contains(&error));
            seen.push(error);
        }
    }

    #[test]
    fn undocumented_codes_are_unknown_and_keep_the_code() {
        for code in [1, -1, 21001, 21009, 21100, 21199, i64::MAX, i64::MIN] {
            assert_eq!(
                ReceiptStatus::classify(code),
                ReceiptStatus::Invalid(ReceiptStatusError::Unknown(code))
            );
        }
    }
}
