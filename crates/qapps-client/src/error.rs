//! API error taxonomy
//!
//! Every failed management API call is classified into an [`ApiErrorKind`] at
//! the adapter boundary. Retrieval code branches on the kind and never on the
//! error message.

use qapps_core::AppError;
use thiserror::Error;

/// Failure class of a management API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Caller is not allowed to perform the call (including user-level-only resources)
    Unauthorized,
    /// Request rate exceeded
    Throttled,
    /// Network failure, timeout or server-side error
    Transient,
    /// Response could not be parsed
    Malformed,
    NotFound,
    /// Anything else, e.g. request validation failures
    Other,
}

impl ApiErrorKind {
    /// Map a service error code to a failure class.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(
                "UnauthorizedException"
                | "AccessDeniedException"
                | "AccessDenied"
                | "ExpiredTokenException"
                | "ExpiredToken"
                | "InvalidClientTokenId"
                | "UnrecognizedClientException",
            ) => ApiErrorKind::Unauthorized,
            Some("ThrottlingException" | "Throttling" | "TooManyRequestsException") => {
                ApiErrorKind::Throttled
            }
            Some("InternalServerException" | "ServiceUnavailableException" | "InternalFailure") => {
                ApiErrorKind::Transient
            }
            Some("ResourceNotFoundException") => ApiErrorKind::NotFound,
            Some(_) => ApiErrorKind::Other,
            // A service error without a code carries nothing we can act on
            None => ApiErrorKind::Transient,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiErrorKind::Throttled | ApiErrorKind::Transient | ApiErrorKind::Malformed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Throttled => "throttled",
            ApiErrorKind::Transient => "transient",
            ApiErrorKind::Malformed => "malformed",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::Other => "other",
        }
    }
}

/// A single failed API call
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{operation} failed ({}): {message}", .kind.as_str())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub operation: &'static str,
    /// Service error code when the service returned one
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The last error of a call after the retry policy gave up
#[derive(Debug, Clone, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct FailedCall {
    pub error: ApiError,
    pub attempts: u32,
}

impl From<FailedCall> for AppError {
    fn from(failed: FailedCall) -> Self {
        match failed.error.kind {
            ApiErrorKind::Unauthorized => AppError::Credentials(failed.to_string()),
            _ => AppError::Api(failed.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_error_codes() {
        assert_eq!(
            ApiErrorKind::from_code(Some("UnauthorizedException")),
            ApiErrorKind::Unauthorized
        );
        assert_eq!(
            ApiErrorKind::from_code(Some("AccessDeniedException")),
            ApiErrorKind::Unauthorized
        );
        assert_eq!(
            ApiErrorKind::from_code(Some("ThrottlingException")),
            ApiErrorKind::Throttled
        );
        assert_eq!(
            ApiErrorKind::from_code(Some("InternalServerException")),
            ApiErrorKind::Transient
        );
        assert_eq!(
            ApiErrorKind::from_code(Some("ResourceNotFoundException")),
            ApiErrorKind::NotFound
        );
        assert_eq!(
            ApiErrorKind::from_code(Some("ValidationException")),
            ApiErrorKind::Other
        );
        assert_eq!(ApiErrorKind::from_code(None), ApiErrorKind::Transient);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ApiErrorKind::Throttled.is_retryable());
        assert!(ApiErrorKind::Transient.is_retryable());
        assert!(ApiErrorKind::Malformed.is_retryable());
        assert!(!ApiErrorKind::Unauthorized.is_retryable());
        assert!(!ApiErrorKind::NotFound.is_retryable());
        assert!(!ApiErrorKind::Other.is_retryable());
    }

    #[test]
    fn test_failed_call_converts_to_app_error() {
        let denied = FailedCall {
            error: ApiError::new(
                ApiErrorKind::Unauthorized,
                "ListApplications",
                "token expired",
            ),
            attempts: 1,
        };
        assert!(matches!(AppError::from(denied), AppError::Credentials(_)));

        let throttled = FailedCall {
            error: ApiError::new(ApiErrorKind::Throttled, "ListApplications", "slow down"),
            attempts: 3,
        };
        let err = AppError::from(throttled);
        assert!(matches!(err, AppError::Api(_)));
        assert!(err.to_string().contains("after 3 attempt(s)"));
    }
}
