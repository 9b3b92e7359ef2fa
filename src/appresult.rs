use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::error::RelayError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<RelayError>() {
            Some(RelayError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(RelayError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(RelayError::Gateway(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "request failed");
        }

        (
            status,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_errors_map_to_statuses() {
        let not_found = AppError::from(RelayError::not_found("room", "x"));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(RelayError::invalid("lang"));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let other = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
