use std::fmt::{Display, Formatter};

use serde_json::Value as JsonValue;

use crate::functions::serializer;

/// Canonical status kinds surfaced by callable Cloud Functions.
///
/// The set matches the `FunctionsErrorCode` union of the JS SDK
/// (`packages/functions/src/public-types.ts`), which in turn mirrors the
/// canonical gRPC status codes. `Ok` never reaches callers as an error; it
/// exists so backend-declared `"OK"` statuses can be recognised and treated
/// as success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionsErrorCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    /// Fully-qualified code string, always `functions/<kind>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "functions/ok",
            FunctionsErrorCode::Cancelled => "functions/cancelled",
            FunctionsErrorCode::Unknown => "functions/unknown",
            FunctionsErrorCode::InvalidArgument => "functions/invalid-argument",
            FunctionsErrorCode::DeadlineExceeded => "functions/deadline-exceeded",
            FunctionsErrorCode::NotFound => "functions/not-found",
            FunctionsErrorCode::AlreadyExists => "functions/already-exists",
            FunctionsErrorCode::PermissionDenied => "functions/permission-denied",
            FunctionsErrorCode::ResourceExhausted => "functions/resource-exhausted",
            FunctionsErrorCode::FailedPrecondition => "functions/failed-precondition",
            FunctionsErrorCode::Aborted => "functions/aborted",
            FunctionsErrorCode::OutOfRange => "functions/out-of-range",
            FunctionsErrorCode::Unimplemented => "functions/unimplemented",
            FunctionsErrorCode::Internal => "functions/internal",
            FunctionsErrorCode::Unavailable => "functions/unavailable",
            FunctionsErrorCode::DataLoss => "functions/data-loss",
            FunctionsErrorCode::Unauthenticated => "functions/unauthenticated",
        }
    }

    /// Bare kind without the namespace prefix, e.g. `out-of-range`. Doubles
    /// as the default error message when the backend supplies no richer one.
    pub fn kind_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "ok",
            FunctionsErrorCode::Cancelled => "cancelled",
            FunctionsErrorCode::Unknown => "unknown",
            FunctionsErrorCode::InvalidArgument => "invalid-argument",
            FunctionsErrorCode::DeadlineExceeded => "deadline-exceeded",
            FunctionsErrorCode::NotFound => "not-found",
            FunctionsErrorCode::AlreadyExists => "already-exists",
            FunctionsErrorCode::PermissionDenied => "permission-denied",
            FunctionsErrorCode::ResourceExhausted => "resource-exhausted",
            FunctionsErrorCode::FailedPrecondition => "failed-precondition",
            FunctionsErrorCode::Aborted => "aborted",
            FunctionsErrorCode::OutOfRange => "out-of-range",
            FunctionsErrorCode::Unimplemented => "unimplemented",
            FunctionsErrorCode::Internal => "internal",
            FunctionsErrorCode::Unavailable => "unavailable",
            FunctionsErrorCode::DataLoss => "data-loss",
            FunctionsErrorCode::Unauthenticated => "unauthenticated",
        }
    }
}

/// Error raised by every failing callable invocation.
///
/// Carries the namespaced code, a human-readable message, and the optional
/// structured `details` value a backend may attach to a declared error.
#[derive(Clone, Debug)]
pub struct FunctionsError {
    pub code: FunctionsErrorCode,
    message: String,
    details: Option<JsonValue>,
}

impl FunctionsError {
    pub fn new(code: FunctionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: FunctionsErrorCode,
        message: impl Into<String>,
        details: JsonValue,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured payload the backend attached to a declared error, already
    /// run through the extended-JSON decoder.
    pub fn details(&self) -> Option<&JsonValue> {
        self.details.as_ref()
    }
}

impl Display for FunctionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for FunctionsError {}

pub type FunctionsResult<T> = Result<T, FunctionsError>;

pub fn invalid_argument(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::Internal, message)
}

/// Client-side timeout error. The message intentionally equals the bare kind,
/// matching what the JS SDK raises from its `failAfter` race.
pub fn deadline_exceeded() -> FunctionsError {
    FunctionsError::new(
        FunctionsErrorCode::DeadlineExceeded,
        FunctionsErrorCode::DeadlineExceeded.kind_str(),
    )
}

/// Maps an HTTP status to the canonical error kind.
///
/// Full table from `codeForHTTPStatus` in `packages/functions/src/error.ts`;
/// status `0` is the transport's stand-in for "no response at all" (network
/// failure or an unreachable backend).
pub fn code_for_http_status(status: u16) -> FunctionsErrorCode {
    if (200..300).contains(&status) {
        return FunctionsErrorCode::Ok;
    }
    match status {
        0 => FunctionsErrorCode::Internal,
        400 => FunctionsErrorCode::InvalidArgument,
        401 => FunctionsErrorCode::Unauthenticated,
        403 => FunctionsErrorCode::PermissionDenied,
        404 => FunctionsErrorCode::NotFound,
        409 => FunctionsErrorCode::Aborted,
        429 => FunctionsErrorCode::ResourceExhausted,
        499 => FunctionsErrorCode::Cancelled,
        500 => FunctionsErrorCode::Internal,
        501 => FunctionsErrorCode::Unimplemented,
        503 => FunctionsErrorCode::Unavailable,
        504 => FunctionsErrorCode::DeadlineExceeded,
        _ => FunctionsErrorCode::Unknown,
    }
}

/// Maps the SCREAMING_SNAKE `status` strings a backend declares in its error
/// body. Unrecognised strings yield `None`, which callers must treat as a
/// malformed response rather than passing the string through.
pub fn code_for_status_string(status: &str) -> Option<FunctionsErrorCode> {
    match status {
        "OK" => Some(FunctionsErrorCode::Ok),
        "CANCELLED" => Some(FunctionsErrorCode::Cancelled),
        "UNKNOWN" => Some(FunctionsErrorCode::Unknown),
        "INVALID_ARGUMENT" => Some(FunctionsErrorCode::InvalidArgument),
        "DEADLINE_EXCEEDED" => Some(FunctionsErrorCode::DeadlineExceeded),
        "NOT_FOUND" => Some(FunctionsErrorCode::NotFound),
        "ALREADY_EXISTS" => Some(FunctionsErrorCode::AlreadyExists),
        "PERMISSION_DENIED" => Some(FunctionsErrorCode::PermissionDenied),
        "RESOURCE_EXHAUSTED" => Some(FunctionsErrorCode::ResourceExhausted),
        "FAILED_PRECONDITION" => Some(FunctionsErrorCode::FailedPrecondition),
        "ABORTED" => Some(FunctionsErrorCode::Aborted),
        "OUT_OF_RANGE" => Some(FunctionsErrorCode::OutOfRange),
        "UNIMPLEMENTED" => Some(FunctionsErrorCode::Unimplemented),
        "INTERNAL" => Some(FunctionsErrorCode::Internal),
        "UNAVAILABLE" => Some(FunctionsErrorCode::Unavailable),
        "DATA_LOSS" => Some(FunctionsErrorCode::DataLoss),
        "UNAUTHENTICATED" => Some(FunctionsErrorCode::Unauthenticated),
        _ => None,
    }
}

/// Decides whether an HTTP response represents a failed call.
///
/// Mirrors `_errorForResponse` in `packages/functions/src/error.ts`: the
/// status code provides the baseline kind and message, an explicit
/// `{ "error": { status, message, details } }` body refines them, and a final
/// kind of `Ok` means the response is not an error at all.
pub fn error_for_http_response(status: u16, body: Option<&JsonValue>) -> Option<FunctionsError> {
    let mut code = code_for_http_status(status);
    let mut message = code.kind_str().to_string();
    let mut details: Option<JsonValue> = None;

    if let Some(error_body) = body.and_then(|value| value.get("error")) {
        if let Some(declared) = error_body.get("status").and_then(JsonValue::as_str) {
            let Some(declared_code) = code_for_status_string(declared) else {
                // The backend invented a status this client does not know.
                return Some(internal_error(FunctionsErrorCode::Internal.kind_str()));
            };
            code = declared_code;
            message = declared.to_string();
        }
        if let Some(explicit) = error_body.get("message").and_then(JsonValue::as_str) {
            message = explicit.to_string();
        }
        if let Some(raw) = error_body.get("details") {
            // Best effort: an undecodable details payload is passed through raw.
            details = Some(serializer::decode(raw.clone()).unwrap_or_else(|_| raw.clone()));
        }
    }

    if code == FunctionsErrorCode::Ok {
        return None;
    }

    Some(match details {
        Some(details) => FunctionsError::with_details(code, message, details),
        None => FunctionsError::new(code, message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn code_strings_are_namespaced() {
        assert_eq!(
            FunctionsErrorCode::OutOfRange.as_str(),
            "functions/out-of-range"
        );
        assert_eq!(FunctionsErrorCode::OutOfRange.kind_str(), "out-of-range");
        assert_eq!(
            FunctionsErrorCode::DeadlineExceeded.as_str(),
            "functions/deadline-exceeded"
        );
    }

    #[test]
    fn display_includes_code() {
        let error = invalid_argument("Function name must not be empty");
        assert_eq!(
            error.to_string(),
            "Function name must not be empty (functions/invalid-argument)"
        );
    }

    #[test]
    fn http_status_table_matches_canonical_mapping() {
        assert_eq!(code_for_http_status(200), FunctionsErrorCode::Ok);
        assert_eq!(code_for_http_status(204), FunctionsErrorCode::Ok);
        assert_eq!(code_for_http_status(0), FunctionsErrorCode::Internal);
        assert_eq!(code_for_http_status(400), FunctionsErrorCode::InvalidArgument);
        assert_eq!(code_for_http_status(401), FunctionsErrorCode::Unauthenticated);
        assert_eq!(code_for_http_status(403), FunctionsErrorCode::PermissionDenied);
        assert_eq!(code_for_http_status(404), FunctionsErrorCode::NotFound);
        assert_eq!(code_for_http_status(409), FunctionsErrorCode::Aborted);
        assert_eq!(code_for_http_status(429), FunctionsErrorCode::ResourceExhausted);
        assert_eq!(code_for_http_status(499), FunctionsErrorCode::Cancelled);
        assert_eq!(code_for_http_status(500), FunctionsErrorCode::Internal);
        assert_eq!(code_for_http_status(501), FunctionsErrorCode::Unimplemented);
        assert_eq!(code_for_http_status(503), FunctionsErrorCode::Unavailable);
        assert_eq!(code_for_http_status(504), FunctionsErrorCode::DeadlineExceeded);
        assert_eq!(code_for_http_status(418), FunctionsErrorCode::Unknown);
    }

    #[test]
    fn success_status_without_error_body_is_not_an_error() {
        assert!(error_for_http_response(200, Some(&json!({ "data": 1 }))).is_none());
        assert!(error_for_http_response(200, None).is_none());
    }

    #[test]
    fn plain_http_error_uses_kind_as_message() {
        let error = error_for_http_response(400, None).unwrap();
        assert_eq!(error.code, FunctionsErrorCode::InvalidArgument);
        assert_eq!(error.message(), "invalid-argument");
        assert!(error.details().is_none());

        let error = error_for_http_response(500, None).unwrap();
        assert_eq!(error.code, FunctionsErrorCode::Internal);
        assert_eq!(error.message(), "internal");
    }

    #[test]
    fn declared_status_overrides_http_status() {
        let body = json!({
            "error": {
                "status": "OUT_OF_RANGE",
                "message": "explicit nope",
                "details": { "start": 10, "end": 20 }
            }
        });
        let error = error_for_http_response(200, Some(&body)).unwrap();
        assert_eq!(error.code, FunctionsErrorCode::OutOfRange);
        assert_eq!(error.message(), "explicit nope");
        assert_eq!(error.details(), Some(&json!({ "start": 10, "end": 20 })));
    }

    #[test]
    fn declared_status_without_message_keeps_raw_status_text() {
        let body = json!({ "error": { "status": "NOT_FOUND" } });
        let error = error_for_http_response(200, Some(&body)).unwrap();
        assert_eq!(error.code, FunctionsErrorCode::NotFound);
        assert_eq!(error.message(), "NOT_FOUND");
    }

    #[test]
    fn unknown_declared_status_is_internal() {
        let body = json!({ "error": { "status": "THIS_IS_NOT_A_REAL_STATUS" } });
        let error = error_for_http_response(200, Some(&body)).unwrap();
        assert_eq!(error.code, FunctionsErrorCode::Internal);
        assert_eq!(error.message(), "internal");
    }

    #[test]
    fn declared_ok_status_suppresses_the_error() {
        let body = json!({ "error": { "status": "OK" } });
        assert!(error_for_http_response(500, Some(&body)).is_none());
    }

    #[test]
    fn wrapped_long_in_details_is_decoded() {
        let body = json!({
            "error": {
                "status": "OUT_OF_RANGE",
                "message": "explicit nope",
                "details": {
                    "start": 10,
                    "end": 20,
                    "long": {
                        "@type": "type.googleapis.com/google.protobuf.Int64Value",
                        "value": "30"
                    }
                }
            }
        });
        let error = error_for_http_response(400, Some(&body)).unwrap();
        assert_eq!(
            error.details(),
            Some(&json!({ "start": 10, "end": 20, "long": 30 }))
        );
    }

    #[test]
    fn undecodable_details_are_kept_raw() {
        let raw_details = json!({ "@type": "something/unsupported", "value": "x" });
        let body = json!({
            "error": { "status": "INTERNAL", "details": raw_details }
        });
        let error = error_for_http_response(500, Some(&body)).unwrap();
        assert_eq!(error.details(), Some(&raw_details));
    }
}
