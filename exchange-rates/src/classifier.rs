//! Transient error classification shared by retry and circuit breaker.

use reqwest::StatusCode;

/// Returns true when an upstream outcome is worth retrying.
///
/// Transient: any error, a missing response, HTTP 5xx, 408 and 429.
/// Everything else (2xx, 3xx, other 4xx) is final and must not count
/// as a breaker failure.
pub fn is_transient<E>(outcome: &Result<Option<StatusCode>, E>) -> bool {
    match outcome {
        Err(_) => true,
        Ok(None) => true,
        Ok(Some(status)) => {
            status.as_u16() >= 500
                || *status == StatusCode::REQUEST_TIMEOUT
                || *status == StatusCode::TOO_MANY_REQUESTS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Result<Option<StatusCode>, String> {
        Ok(Some(StatusCode::from_u16(code).unwrap()))
    }

    #[test]
    fn test_errors_are_transient() {
        let outcome: Result<Option<StatusCode>, String> = Err("connection reset".into());
        assert!(is_transient(&outcome));
    }

    #[test]
    fn test_missing_response_is_transient() {
        let outcome: Result<Option<StatusCode>, String> = Ok(None);
        assert!(is_transient(&outcome));
    }

    #[test]
    fn test_transient_status_codes() {
        for code in [500, 502, 503, 504, 408, 429] {
            assert!(is_transient(&status(code)), "{code} should be transient");
        }
    }

    #[test]
    fn test_final_status_codes() {
        for code in [200, 201, 204, 301, 400, 401, 403, 404, 405, 422] {
            assert!(!is_transient(&status(code)), "{code} should not be transient");
        }
    }
}
