//! HTTP error type. Every failure reaches the client as `{ "error": "..." }`
//! with a natural-language message.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::chat::{AuthError, ChatError};
use crate::mission::MissionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub message: String,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self { status, message: message.into() }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(StatusCode::NOT_FOUND, message)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(ErrorResponse { error: self.message })).into_response()
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    let status = match &e {
      AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
      AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
      AuthError::EmailTaken => StatusCode::CONFLICT,
      AuthError::Internal(_) => {
        error!(target: "chat", error = %e, "Auth backend failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    Self::new(status, e.to_string())
  }
}

impl From<ChatError> for ApiError {
  fn from(e: ChatError) -> Self {
    let e = match e {
      ChatError::Auth(inner) => return Self::from(inner),
      other => other,
    };
    let status = match &e {
      ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
      ChatError::FileTooLarge { size, max } => {
        warn!(target: "chat", size, max, "Upload over the size ceiling");
        StatusCode::PAYLOAD_TOO_LARGE
      }
      ChatError::NotSignedIn => StatusCode::UNAUTHORIZED,
      ChatError::OrganizerRequired => StatusCode::FORBIDDEN,
      ChatError::NotFound => StatusCode::NOT_FOUND,
      ChatError::Auth(_) | ChatError::Storage(_) | ChatError::Repository(_) => {
        error!(target: "chat", error = %e, "Chat backend failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    Self::new(status, e.to_string())
  }
}

impl From<MissionError> for ApiError {
  fn from(e: MissionError) -> Self {
    let status = match e {
      MissionError::UnknownRun => StatusCode::NOT_FOUND,
      MissionError::AlreadyCompleted => StatusCode::CONFLICT,
    };
    Self::new(status, e.to_string())
  }
}

impl From<tokio::task::JoinError> for ApiError {
  fn from(e: tokio::task::JoinError) -> Self {
    error!(target: "zirka_backend", error = %e, "Blocking task failed");
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Внутрішня помилка сервера")
  }
}
