use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use tandem_registry::RegistryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Registry(e) => (registry_status(e), self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn registry_status(error: &RegistryError) -> StatusCode {
    match error {
        RegistryError::NotFound => StatusCode::NOT_FOUND,
        // Join race loser and self-join are both conflicts with the
        // record's current state.
        RegistryError::AlreadyPaired | RegistryError::SelfJoin => StatusCode::CONFLICT,
        RegistryError::Unauthenticated => StatusCode::UNAUTHORIZED,
        RegistryError::InvalidCode(_) => StatusCode::BAD_REQUEST,
        RegistryError::WriteFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RegistryError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_status_mapping() {
        assert_eq!(registry_status(&RegistryError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            registry_status(&RegistryError::AlreadyPaired),
            StatusCode::CONFLICT
        );
        assert_eq!(registry_status(&RegistryError::SelfJoin), StatusCode::CONFLICT);
        assert_eq!(
            registry_status(&RegistryError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            registry_status(&RegistryError::WriteFailure("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
