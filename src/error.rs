use thiserror::Error;

use crate::gateway::GatewayError;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid {0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("transport: {0}")]
    Transport(#[from] axum::Error),
}

impl RelayError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound { kind, id: id.to_string() }
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }
}
