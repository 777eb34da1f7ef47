//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses or WebSocket frames. Every error carries two machine-readable
//! values: an [`ErrorCode`] selecting the failure category (and therefore the
//! transport status) and a [`FailureReason`] naming the business rule that
//! rejected the request. Clients and tests branch on those, never on the
//! free-text message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with the current state of the resource.
    Conflict,
    /// An upstream provider (payment gateway, carrier) failed.
    BadGateway,
    /// A backing service is temporarily unavailable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Business-rule reason attached to every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Missing or malformed input.
    ValidationError,
    /// Referenced aggregate is absent or not owned by the caller.
    NotFound,
    /// Caller is not allowed to act on the resource.
    AuthorizationError,
    /// Caller tried to trade with themselves.
    SelfTrade,
    /// Checkout attempted with an empty cart.
    EmptyCart,
    /// Payment callback signature did not verify.
    PaymentSignature,
    /// Requested status move is not permitted from the current status.
    InvalidTransition,
    /// Payment or shipping provider failed.
    UpstreamGateway,
    /// Concurrent writer changed the aggregate first.
    RevisionMismatch,
    /// Missing or invalid credentials.
    Unauthenticated,
    /// Storage or connection failure.
    Unavailable,
    /// Anything else.
    Internal,
}

impl FailureReason {
    /// Stable string form used in response bodies and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::AuthorizationError => "authorization_error",
            Self::SelfTrade => "self_trade",
            Self::EmptyCart => "empty_cart",
            Self::PaymentSignature => "payment_signature",
            Self::InvalidTransition => "invalid_transition",
            Self::UpstreamGateway => "upstream_gateway",
            Self::RevisionMismatch => "revision_mismatch",
            Self::Unauthenticated => "unauthenticated",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }

    const fn default_for(code: ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidRequest => Self::ValidationError,
            ErrorCode::Unauthorized => Self::Unauthenticated,
            ErrorCode::Forbidden => Self::AuthorizationError,
            ErrorCode::NotFound => Self::NotFound,
            ErrorCode::Conflict => Self::RevisionMismatch,
            ErrorCode::BadGateway => Self::UpstreamGateway,
            ErrorCode::ServiceUnavailable => Self::Unavailable,
            ErrorCode::InternalError => Self::Internal,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
/// - `trace_id`, when present, must be non-empty.
///
/// # Examples
/// ```
/// use marketplace::domain::{Error, ErrorCode, FailureReason};
///
/// let err = Error::self_trade("you cannot buy your own book");
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// assert_eq!(err.reason(), FailureReason::SelfTrade);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    reason: FailureReason,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// Messages must carry human-readable text.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// Trace identifiers must not be blank.
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// # Panics
    /// Panics when `message` is blank. Constructors below always pass literal
    /// or formatted non-empty text.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message and captures the
    /// trace identifier in scope, if any.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            reason: FailureReason::default_for(code),
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Business-rule reason for the failure.
    pub fn reason(&self) -> FailureReason {
        self.reason
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was built.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Override the business-rule reason.
    #[must_use]
    pub fn with_reason(mut self, reason: FailureReason) -> Self {
        self.reason = reason;
        self
    }

    /// Attach structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a trace identifier, panicking on blank input.
    ///
    /// # Panics
    /// Panics when `trace_id` is blank.
    #[must_use]
    pub fn with_trace_id(self, trace_id: impl Into<String>) -> Self {
        match self.try_with_trace_id(trace_id) {
            Ok(value) => value,
            Err(err) => panic!("trace identifiers must satisfy validation: {err}"),
        }
    }

    /// Fallible variant of [`Error::with_trace_id`].
    pub fn try_with_trace_id(
        mut self,
        trace_id: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        self.trace_id = Some(trace_id);
        Ok(self)
    }

    /// Missing or malformed input (`validation_error`).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Missing or invalid credentials.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Caller is not the owner or a participant (`authorization_error`).
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Referenced aggregate is absent or not visible to the caller.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Concurrent modification detected.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Upstream provider failure (`upstream_gateway`).
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadGateway, message)
    }

    /// Backing service unavailable.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Unexpected failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Buyer and seller are the same user.
    pub fn self_trade(message: impl Into<String>) -> Self {
        Self::forbidden(message).with_reason(FailureReason::SelfTrade)
    }

    /// Checkout attempted with nothing in the cart.
    pub fn empty_cart(message: impl Into<String>) -> Self {
        Self::invalid_request(message).with_reason(FailureReason::EmptyCart)
    }

    /// Payment signature mismatch.
    pub fn payment_signature(message: impl Into<String>) -> Self {
        Self::invalid_request(message).with_reason(FailureReason::PaymentSignature)
    }

    /// Status move outside the allowed successor set. Surfaced as a bad
    /// request rather than a conflict so existing clients keep working.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::invalid_request(message).with_reason(FailureReason::InvalidTransition)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    reason: FailureReason,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            reason: value.reason,
            message: value.message,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            reason,
            message,
            trace_id,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?.with_reason(reason);
        // Deserialised payloads carry their own trace id; drop the ambient one.
        error.trace_id = None;
        if let Some(id) = trace_id {
            error = error.try_with_trace_id(id)?;
        }
        error.details = details;
        Ok(error)
    }
}
