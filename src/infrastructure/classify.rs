//! Shared error classification for the backend HTTP clients
//!
//! Maps transport failures and HTTP status codes onto the backend error
//! taxonomy so the retry layer sees uniform kinds regardless of which
//! client produced the failure.

use reqwest::StatusCode;

use crate::application::ports::outbound::BackendError;

/// Classify a reqwest transport error
pub(crate) fn classify_transport(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else if error.is_connect() {
        BackendError::Connection(error.to_string())
    } else {
        BackendError::Api(error.to_string())
    }
}

/// Classify a non-success HTTP status with its response body
pub(crate) fn classify_status(status: StatusCode, body: String) -> BackendError {
    match status.as_u16() {
        401 | 403 => BackendError::Auth(body),
        408 => BackendError::Timeout,
        429 => BackendError::RateLimited,
        400 | 404 | 422 => BackendError::Validation(body),
        _ => BackendError::Api(format!("{status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::BackendErrorKind;

    #[test]
    fn test_status_classification() {
        let cases = [
            (StatusCode::UNAUTHORIZED, BackendErrorKind::Auth),
            (StatusCode::FORBIDDEN, BackendErrorKind::Auth),
            (StatusCode::TOO_MANY_REQUESTS, BackendErrorKind::RateLimited),
            (StatusCode::BAD_REQUEST, BackendErrorKind::Validation),
            (StatusCode::REQUEST_TIMEOUT, BackendErrorKind::Timeout),
            (StatusCode::INTERNAL_SERVER_ERROR, BackendErrorKind::Api),
            (StatusCode::SERVICE_UNAVAILABLE, BackendErrorKind::Api),
        ];
        for (status, expected) in cases {
            assert_eq!(
                classify_status(status, String::new()).kind(),
                expected,
                "status {status}"
            );
        }
    }
}
