//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every failure is an `invalid_request` error whose details name the
//! offending field, the raw value and a stable code.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidEnum,
    NotPositive,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidEnum => "invalid_value",
            ErrorCode::NotPositive => "not_positive",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: Option<&str>) -> Error {
    let details = match value {
        Some(value) => json!({"field": field.as_str(), "value": value, "code": code.as_str()}),
        None => json!({"field": field.as_str(), "code": code.as_str()}),
    };
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
        None,
    )
}

/// Require a non-blank string.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or_else(|| missing_field_error(field))
}

/// Require a finite number strictly above zero.
pub(crate) fn require_positive(value: Option<f64>, field: FieldName) -> Result<f64, Error> {
    let number = value.ok_or_else(|| missing_field_error(field))?;
    if number.is_finite() && number > 0.0 {
        return Ok(number);
    }
    let name = field.as_str();
    Err(field_error(
        field,
        format!("{name} must be a positive number"),
        ErrorCode::NotPositive,
        Some(&number.to_string()),
    ))
}

/// Parse a UUID-backed identifier such as `BookId` or `AddressId`.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        field_error(
            field,
            format!("{name} must be a valid UUID"),
            ErrorCode::InvalidUuid,
            Some(value),
        )
    })
}

/// Parse one of a closed set of wire values, listing the accepted ones.
pub(crate) fn parse_enum<T: FromStr>(
    value: &str,
    field: FieldName,
    accepted: &[&str],
) -> Result<T, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        field_error(
            field,
            format!("{name} must be one of: {}", accepted.join(", ")),
            ErrorCode::InvalidEnum,
            Some(value),
        )
    })
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            let name = field.as_str();
            field_error(
                field,
                format!("{name} must be an RFC 3339 timestamp"),
                ErrorCode::InvalidTimestamp,
                Some(value),
            )
        })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}
