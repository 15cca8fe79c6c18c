//! HTTP handlers for authentication and the chat.

use axum::{
  extract::{Multipart, Path, State},
  http::{header::AUTHORIZATION, HeaderMap, StatusCode},
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::chat::composer::{Composer, SelectedFile};
use crate::chat::ChatError;
use crate::domain::{ChatMessage, Session};
use crate::error::ApiError;
use crate::protocol::*;
use crate::state::AppState;

pub fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

async fn session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
  state.session_for(bearer(headers)).await
}

pub async fn http_sign_up(
  State(state): State<AppState>,
  Json(body): Json<SignUpIn>,
) -> Result<(StatusCode, Json<SessionOut>), ApiError> {
  let s = state.auth.sign_up(&body.email, &body.password, body.display_name.as_deref()).await?;
  Ok((StatusCode::CREATED, Json(s.into())))
}

pub async fn http_sign_in(
  State(state): State<AppState>,
  Json(body): Json<SignInIn>,
) -> Result<Json<SessionOut>, ApiError> {
  Ok(Json(state.auth.sign_in(&body.email, &body.password).await?.into()))
}

pub async fn http_sign_out(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
  if let Some(token) = bearer(&headers) {
    state.auth.sign_out(token).await?;
  }
  Ok(StatusCode::NO_CONTENT)
}

pub async fn http_session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionOut>, ApiError> {
  let s = session(&state, &headers).await.ok_or(ChatError::NotSignedIn)?;
  Ok(Json(s.into()))
}

pub async fn http_history(State(state): State<AppState>) -> Result<Json<Vec<ChatMessage>>, ApiError> {
  Ok(Json(state.chat.history().await?))
}

pub async fn http_send_message(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(body): Json<SendMessageIn>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
  let s = session(&state, &headers).await;
  let m = state.chat.send_message(s.as_ref(), &body.content, body.display_name.as_deref()).await?;
  Ok((StatusCode::CREATED, Json(m)))
}

pub async fn http_edit_message(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(body): Json<EditMessageIn>,
) -> Result<Json<ChatMessage>, ApiError> {
  let s = session(&state, &headers).await;
  Ok(Json(state.chat.edit_message(s.as_ref(), id, &body.content).await?))
}

pub async fn http_delete_message(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
  let s = session(&state, &headers).await;
  state.chat.delete_message(s.as_ref(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn http_delete_all(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ClearedOut>, ApiError> {
  let s = session(&state, &headers).await;
  let count = state.chat.delete_all(s.as_ref()).await?;
  Ok(Json(ClearedOut { count }))
}

/// Multipart upload: a `file` field and an optional `displayName` field.
#[instrument(level = "info", skip_all)]
pub async fn http_upload(
  State(state): State<AppState>,
  headers: HeaderMap,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
  let s = session(&state, &headers).await;
  let max = state.chat.max_upload_bytes();
  let mut composer = Composer::new(max);
  let mut display_name = None;

  while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, max))? {
    match field.name().unwrap_or("") {
      "file" => {
        let name = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, max))?;
        composer.select_file(SelectedFile { name, bytes: bytes.to_vec() });
      }
      "displayName" => {
        display_name = Some(field.text().await.map_err(|e| multipart_error(e, max))?);
      }
      _ => {}
    }
  }

  if let Some(notice) = composer.notices().first() {
    return Err(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, notice.clone()));
  }
  let file = composer.take_file().ok_or_else(|| ApiError::bad_request("Оберіть файл для надсилання"))?;
  let m = state.chat.upload_file(s.as_ref(), &file.name, &file.bytes, display_name.as_deref()).await?;
  info!(target: "chat", id = %m.id, "Upload handled");
  Ok((StatusCode::CREATED, Json(m)))
}

fn multipart_error(e: axum::extract::multipart::MultipartError, max: usize) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ChatError::FileTooLarge { size: max + 1, max }.into()
  } else {
    ApiError::bad_request(format!("Некоректний запит: {}", e.body_text()))
  }
}
