use crate::errors::ValidationError;

use super::receipt::Receipt;

/// Produced once per validation call.
pub type ValidationResult = Result<Receipt, ValidationError>;
