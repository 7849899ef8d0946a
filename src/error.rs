use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Field-level validation failures, reported before anything is written.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("missing or invalid identity")]
    Unauthorized,
    #[error("not the owner of this resource")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error("storage backend failure")]
    Storage(#[source] anyhow::Error),
    #[error("database failure")]
    Persist(#[from] sqlx::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "errors": errors.0 })),
            )
                .into_response(),
            Error::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "missing or invalid identity").into_response()
            }
            Error::Forbidden => {
                (StatusCode::FORBIDDEN, "not the owner of this resource").into_response()
            }
            Error::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Error::Storage(e) => {
                error!(error = %e, "storage backend failure");
                generic_failure()
            }
            Error::Persist(e) => {
                error!(error = %e, "database failure");
                generic_failure()
            }
        }
    }
}

// Persist/storage detail stays in the logs; the caller only learns that
// nothing was saved.
fn generic_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "the operation failed and no changes were saved",
    )
        .into_response()
}
