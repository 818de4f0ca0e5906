//! Service errors -> HTTP responses.
//!
//! Domain failures become 4xx responses the action returns itself. Anything
//! else is handed back to the dispatcher as an error, which logs it and
//! answers with the generic 500.

use axum::http::StatusCode;
use axum::response::Response;

use tollgate_core::DomainError;
use tollgate_router::errors::{bad_request, json_message};

use crate::app::services::ServiceError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => bad_request(msg),
        DomainError::NotFound => json_message(StatusCode::NOT_FOUND, "Not found"),
        DomainError::Conflict(msg) => json_message(StatusCode::CONFLICT, msg),
        DomainError::InvalidCredentials => {
            json_message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE)
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> anyhow::Result<Response> {
    match err {
        ServiceError::Domain(e) => Ok(domain_error_to_response(e)),
        other => Err(other.into()),
    }
}

/// A body that parsed as JSON but does not have the expected shape.
pub fn invalid_body(name: &str, err: serde_json::Error) -> Response {
    bad_request(format!("{name} is invalid: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found(), StatusCode::NOT_FOUND),
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
        ];

        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn token_failures_stay_internal() {
        let err = ServiceError::Token(tollgate_auth::TokenError::Signing("boom".into()));
        assert!(service_error_to_response(err).is_err());
    }
}
