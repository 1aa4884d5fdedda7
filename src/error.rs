//! Request-level error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything that can reject an inbound relay request.
///
/// Response bodies stay generic on purpose: no internal detail, digest, or
/// secret material ever leaves the process in an error response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("invalid or missing signature")]
    Unauthorized,
    #[error("request body is not valid JSON")]
    InvalidPayload,
    #[error("request body exceeds the configured size limit")]
    PayloadTooLarge,
    #[error("forwarding destination is misconfigured")]
    Misconfigured,
    #[error("internal error")]
    Internal,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Misconfigured => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::Unauthorized => "Unauthorized",
            Self::InvalidPayload => "Bad Request",
            Self::PayloadTooLarge => "Payload too large",
            Self::Misconfigured => "Upstream error",
            Self::Internal => "Internal error",
        };
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(RelayError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(RelayError::InvalidPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(RelayError::Misconfigured.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            RelayError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
