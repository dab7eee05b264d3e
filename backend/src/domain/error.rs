//! Domain-level error type and the JSON failure envelope.
//!
//! Errors are transport agnostic. The HTTP adapter maps [`ErrorCode`] to a
//! status and serialises the error as
//! `{"success": false, "error": "...", "code": "...", "traceId": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist or is not visible to the caller.
    NotFound,
    /// An unexpected error occurred inside the domain or an outbound adapter.
    InternalError,
}

/// Domain error payload.
///
/// The trace identifier in scope at construction time is captured so the
/// envelope can be correlated with logs.
///
/// # Examples
/// ```
/// use emoji_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("Emoji not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "Emoji not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorEnvelope", into = "ErrorEnvelope")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

impl Error {
    /// Create a new error. Blank messages are replaced with a generic one.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            String::from("Unexpected error")
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to clients.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was raised.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach a trace identifier to the error.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use emoji_backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad")
    ///     .with_details(json!({ "field": "prompt" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Drop any structured details, keeping code, message, and trace id.
    pub fn without_details(mut self) -> Self {
        self.details = None;
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

/// Wire shape of a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Always `false` for failures.
    #[schema(example = false)]
    success: bool,
    /// Human-readable message.
    #[schema(example = "Authentication required")]
    error: String,
    /// Stable machine-readable code.
    #[schema(example = "unauthorized")]
    code: ErrorCode,
    /// Correlation identifier for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    /// Structured context such as the offending field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorEnvelope {
    fn from(value: Error) -> Self {
        Self {
            success: false,
            error: value.message,
            code: value.code,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

/// Raised when a payload claims to be an error envelope but reports success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error envelope must carry success = false")]
pub struct EnvelopeSuccessFlagError;

impl TryFrom<ErrorEnvelope> for Error {
    type Error = EnvelopeSuccessFlagError;

    fn try_from(value: ErrorEnvelope) -> Result<Self, Self::Error> {
        if value.success {
            return Err(EnvelopeSuccessFlagError);
        }
        Ok(Self {
            code: value.code,
            message: value.error,
            trace_id: value.trace_id,
            details: value.details,
        })
    }
}
