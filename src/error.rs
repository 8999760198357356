//! Error types.
//!
//! Two kinds of failure exist and they never mix:
//!
//! - [`ApiError`] is the request-level failure. Validators and handlers
//!   return it; the router converts it into a reply exactly once, at the top
//!   of [`Router::run`](crate::Router::run).
//! - [`Error`] covers infrastructure: binding a port, accepting connections,
//!   or naming a status code that is not in the registry.

use serde_json::json;
use thiserror::Error;

use crate::response::Response;
use crate::status::Status;

/// Domain code for a generic invalid request.
pub const INVALID_REQUEST: i64 = 0;

/// The error type returned by donner's infrastructure operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown HTTP status code {0}")]
    UnknownStatus(u16),

    #[error("unknown HTTP status name `{0}`")]
    UnknownStatusName(String),
}

/// A request-level failure: domain code, message and the HTTP status the
/// client receives.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{status}: {message} (code {code})")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    pub status: Status,
}

impl ApiError {
    /// `400 Bad Request` with code [`INVALID_REQUEST`].
    pub fn new(message: impl Into<String>) -> Self {
        Self::invalid(message, INVALID_REQUEST)
    }

    /// `400 Bad Request` with a caller-chosen domain code.
    pub fn invalid(message: impl Into<String>, code: i64) -> Self {
        Self { code, message: message.into(), status: Status::BadRequest }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Renders `{"error":{"code":…,"message":…}}` with this error's status.
    pub fn into_response(self) -> Response {
        let body = json!({ "error": { "code": self.code, "message": self.message } });
        Response::builder()
            .status(self.status)
            .json(serde_json::to_vec(&body).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_invalid_request() {
        let err = ApiError::new("Invalid user ID");
        assert_eq!(err.code, INVALID_REQUEST);
        assert_eq!(err.status, Status::BadRequest);
    }

    #[test]
    fn renders_error_envelope() {
        let resp = ApiError::invalid("nope", 7).with_status(Status::Forbidden).into_response();
        assert_eq!(resp.status_code(), 403);
        assert_eq!(resp.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, json!({ "error": { "code": 7, "message": "nope" } }));
    }

    #[test]
    fn display_includes_status_and_code() {
        let err = ApiError::invalid("bad page", 3);
        assert_eq!(err.to_string(), "400 Bad Request: bad page (code 3)");
    }
}
