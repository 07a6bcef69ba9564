use std::time::Duration;

use serde_json::Value;

use crate::{error::ProtocolError, payload::JsonObject};

/// Code assigned to failures whose body carries no usable `errcode`.
pub const UNKNOWN_ERRCODE: &str = "M_UNKNOWN";

/// Turn a non-success response into a [`ProtocolError`]. Never fails.
///
/// Bodies that are empty, not JSON objects, or lack a string `errcode` become
/// `M_UNKNOWN` with a status-derived message. `error` and `retry_after_ms`
/// are optional; a member of the wrong type is ignored rather than voiding
/// the `errcode`. The raw bytes are always kept.
pub fn map_error_response(status: u16, body: &[u8]) -> ProtocolError {
    let Some(object) = serde_json::from_slice::<JsonObject>(body).ok() else {
        return unknown(status, body);
    };
    let Some(code) = object
        .get("errcode")
        .and_then(Value::as_str)
        .filter(|code| !code.trim().is_empty())
    else {
        return unknown(status, body);
    };

    let message = object
        .get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| status_message(status));
    let error = ProtocolError::new(status, code, message, body.to_vec());
    match object.get("retry_after_ms").and_then(retry_after_ms) {
        Some(delay) => error.with_retry_after(delay),
        None => error,
    }
}

fn unknown(status: u16, body: &[u8]) -> ProtocolError {
    ProtocolError::new(status, UNKNOWN_ERRCODE, status_message(status), body.to_vec())
}

/// Whole or fractional milliseconds; negative and non-numeric values yield `None`.
fn retry_after_ms(value: &Value) -> Option<Duration> {
    if let Some(ms) = value.as_u64() {
        return Some(Duration::from_millis(ms));
    }
    value
        .as_f64()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
}

/// Parse a delta-seconds `Retry-After` header value.
///
/// HTTP-date values are not supported and yield `None`.
pub fn retry_after_from_header(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn status_message(status: u16) -> String {
    format!("homeserver returned HTTP {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, LIMIT_EXCEEDED_ERRCODE};

    #[test]
    fn maps_structured_error_body() {
        let body = br#"{"errcode":"M_INVALID_USERNAME","error":"bad"}"#;
        let err = map_error_response(400, body);
        assert_eq!(err.status(), 400);
        assert_eq!(err.code(), "M_INVALID_USERNAME");
        assert_eq!(err.message(), "bad");
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.raw(), body);
    }

    #[test]
    fn empty_body_becomes_unknown() {
        let err = map_error_response(500, b"");
        assert_eq!(err.code(), UNKNOWN_ERRCODE);
        assert!(err.raw().is_empty());
        assert!(err.message().contains("500"));
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn unusable_bodies_become_unknown_and_keep_raw_bytes() {
        for body in [
            &b"<html>bad gateway</html>"[..],
            br#"["M_FORBIDDEN"]"#,
            br#"{"error":"no code"}"#,
            br#"{"errcode":""}"#,
        ] {
            let err = map_error_response(502, body);
            assert_eq!(err.code(), UNKNOWN_ERRCODE);
            assert_eq!(err.raw(), body);
        }
    }

    #[test]
    fn missing_message_falls_back_to_status() {
        let err = map_error_response(403, br#"{"errcode":"M_FORBIDDEN"}"#);
        assert_eq!(err.code(), "M_FORBIDDEN");
        assert_eq!(err.message(), "homeserver returned HTTP 403");
    }

    #[test]
    fn reads_retry_after_ms() {
        let body = br#"{"errcode":"M_LIMIT_EXCEEDED","error":"Too many requests","retry_after_ms":2000}"#;
        let err = map_error_response(429, body);
        assert_eq!(err.code(), LIMIT_EXCEEDED_ERRCODE);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(err.category(), ErrorCategory::RateLimited);
    }

    #[test]
    fn mistyped_optional_members_keep_errcode() {
        let err = map_error_response(403, br#"{"errcode":"M_FORBIDDEN","error":{"en":"nope"}}"#);
        assert_eq!(err.code(), "M_FORBIDDEN");
        assert_eq!(err.message(), "homeserver returned HTTP 403");

        let err = map_error_response(429, br#"{"errcode":"M_LIMIT_EXCEEDED","retry_after_ms":-1}"#);
        assert_eq!(err.code(), LIMIT_EXCEEDED_ERRCODE);
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.category(), ErrorCategory::RateLimited);

        let err = map_error_response(429, br#"{"errcode":"M_LIMIT_EXCEEDED","retry_after_ms":"soon"}"#);
        assert_eq!(err.code(), LIMIT_EXCEEDED_ERRCODE);
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn accepts_fractional_retry_after_ms() {
        let body = br#"{"errcode":"M_LIMIT_EXCEEDED","error":"slow","retry_after_ms":1500.0}"#;
        let err = map_error_response(429, body);
        assert_eq!(err.code(), LIMIT_EXCEEDED_ERRCODE);
        assert_eq!(err.message(), "slow");
        assert_eq!(err.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(err.category(), ErrorCategory::RateLimited);
    }

    #[test]
    fn non_string_errcode_becomes_unknown() {
        let err = map_error_response(400, br#"{"errcode":42,"error":"odd"}"#);
        assert_eq!(err.code(), UNKNOWN_ERRCODE);
    }

    #[test]
    fn parses_delta_seconds_header() {
        assert_eq!(retry_after_from_header(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(
            retry_after_from_header("Wed, 21 Oct 2015 07:28:00 GMT"),
            None
        );
    }
}
