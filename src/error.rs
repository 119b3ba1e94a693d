use axum::extract::rejection::JsonRejection;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::issue::IssueError;
use crate::routes::ApiResponse;

pub const FALLBACK_MESSAGE: &str = "Failed to generate certificate";

#[derive(Debug)]
pub enum AppError {
    /// Request failed shape validation.
    Invalid(String),
    /// Well-formed request with no roster match.
    NotFound,
    /// Roster, template or font could not be read or parsed.
    Asset(String),
    /// Anything else that went wrong while handling the request.
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Invalid(_) | AppError::NotFound => StatusCode::BAD_REQUEST,
            AppError::Asset(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::Invalid(message) | AppError::Asset(message) => message.clone(),
            AppError::NotFound => crate::issue::NOT_FOUND_MESSAGE.to_string(),
            AppError::Internal => FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Invalid(message) => AppError::Invalid(message),
            IssueError::NotFound => AppError::NotFound,
            IssueError::Roster(e) => AppError::Asset(e.to_string()),
            IssueError::Render(e) => AppError::Asset(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Invalid(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!("Certificate generation error: {}", message);
        }
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}
