//! Classification of HTTP and transport outcomes into [`ApiError`].
//!
//! The only place a [`StatusError`] is created. No retries, no
//! transformation of the body beyond lossy UTF-8 decoding.

use std::time::Duration;

use crate::error::{ApiError, StatusError};
use crate::transport::TransportFailure;

/// `None` for 2xx; otherwise an `ApiError::Status` carrying status, reason
/// and the raw body (omitted when empty).
pub fn error_for_status(status: u16, reason: &str, body: &[u8]) -> Option<ApiError> {
    if (200..300).contains(&status) {
        return None;
    }
    let body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(body).into_owned())
    };
    Some(ApiError::Status(StatusError::new(
        status,
        reason.to_string(),
        body,
    )))
}

/// Map a failure below the HTTP layer. `elapsed` is measured by the engine
/// around the transport call, so both modes report it the same way.
pub fn map_transport_failure(failure: TransportFailure, elapsed: Duration) -> ApiError {
    match failure {
        TransportFailure::TimedOut => ApiError::TransportTimeout { elapsed },
        TransportFailure::Failed { kind, message } => ApiError::Transport { kind, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;

    #[test]
    fn success_range_produces_no_error() {
        assert!(error_for_status(200, "OK", b"").is_none());
        assert!(error_for_status(204, "No Content", b"").is_none());
        assert!(error_for_status(299, "", b"x").is_none());
    }

    #[test]
    fn not_found_keeps_status_reason_and_body() {
        let err = error_for_status(404, "Not Found", b"{\"message\":\"no member\"}").unwrap();
        match err {
            ApiError::Status(status) => {
                assert_eq!(status.status(), 404);
                assert_eq!(status.reason(), "Not Found");
                assert_eq!(status.body(), Some("{\"message\":\"no member\"}"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn redirects_and_informational_codes_are_errors() {
        assert_eq!(error_for_status(302, "Found", b"").unwrap().status(), Some(302));
        assert_eq!(error_for_status(500, "Internal Server Error", b"").unwrap().status(), Some(500));
    }

    #[test]
    fn empty_body_is_omitted() {
        let err = error_for_status(401, "Unauthorized", b"").unwrap();
        assert!(matches!(err, ApiError::Status(ref s) if s.body().is_none()));
    }

    #[test]
    fn transport_failures_keep_their_own_kinds() {
        let elapsed = Duration::from_millis(250);
        let err = map_transport_failure(TransportFailure::TimedOut, elapsed);
        assert!(matches!(err, ApiError::TransportTimeout { elapsed: e } if e == elapsed));

        let err = map_transport_failure(
            TransportFailure::Failed {
                kind: TransportErrorKind::Connect,
                message: "connection refused".to_string(),
            },
            elapsed,
        );
        assert!(matches!(
            err,
            ApiError::Transport {
                kind: TransportErrorKind::Connect,
                ..
            }
        ));
        assert!(err.status().is_none());
    }
}
