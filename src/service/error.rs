//! Service-level error taxonomy.

use thiserror::Error;

use crate::predictor::PredictError;
use crate::types::TargetError;

/// Errors surfaced to callers of the service operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Malformed or out-of-domain request. Not retried.
    #[error("{0}")]
    InvalidRequest(String),
    /// No predictor for the requested target / mode.
    #[error("{0}")]
    ModelUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable error code carried in the response envelope.
    pub const fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidRequest(_) => "BAD_REQUEST",
            ServiceError::ModelUnavailable(_) => "SERVICE_UNAVAILABLE",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<TargetError> for ServiceError {
    fn from(e: TargetError) -> Self {
        ServiceError::InvalidRequest(e.to_string())
    }
}

impl From<PredictError> for ServiceError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::ModelUnavailable { .. } => ServiceError::ModelUnavailable(e.to_string()),
            PredictError::Evaluation(_) => ServiceError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetProperty;

    #[test]
    fn test_error_codes() {
        let unavailable: ServiceError = PredictError::ModelUnavailable {
            target: TargetProperty::YieldStrength,
            mode: "x".to_string(),
            reason: "missing".to_string(),
        }
        .into();
        assert_eq!(unavailable.code(), "SERVICE_UNAVAILABLE");

        let internal: ServiceError = PredictError::Evaluation("overflow".to_string()).into();
        assert_eq!(internal.code(), "INTERNAL_ERROR");

        let invalid: ServiceError = TargetError::ToleranceOutOfRange(2.0).into();
        assert_eq!(invalid.code(), "BAD_REQUEST");
        assert!(invalid.to_string().contains("Tolerance"));
    }
}
