// src/error.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::FormRejection;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed poll identifier")]
    InvalidIdentifier,

    #[error("Field `{0}` must not be blank")]
    MissingField(&'static str),

    #[error("Ballot has no options")]
    EmptyBallot,

    #[error("Poll not found")]
    PollNotFound,

    #[error("Could not allocate a unique poll identifier")]
    IdentifierExhausted,

    #[error("{message}")]
    Body { status: StatusCode, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        let message = rejection.to_string();
        AppError::Body {
            status: rejection.into_response().status(),
            message,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier | AppError::MissingField(_) | AppError::EmptyBallot => {
                StatusCode::BAD_REQUEST
            }
            AppError::PollNotFound => StatusCode::NOT_FOUND,
            AppError::Body { status, .. } => *status,
            AppError::IdentifierExhausted | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // Store details stay in the logs
            error!("{self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
