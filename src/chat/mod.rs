//! Live chat: messages, file attachments and the realtime event feed.
//!
//! `ChatService` depends only on the ports in `ports`; every failure comes
//! back as a `ChatError` whose `Display` is the notice shown to the user.
//! Organizer checks run before any repository call.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{ChatMessage, MessageKind, Session, User};

pub mod auth;
pub mod composer;
pub mod messages;
pub mod ports;
pub mod storage;

use ports::{MessageRepository, ObjectStorage};

const MIB: usize = 1024 * 1024;
const EVENT_BUFFER: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
  #[error("Невірна електронна пошта або пароль")]
  InvalidCredentials,
  #[error("Некоректна адреса електронної пошти")]
  InvalidEmail,
  #[error("Пароль має містити щонайменше {} символів", auth::MIN_PASSWORD_LEN)]
  WeakPassword,
  #[error("Користувач з такою поштою вже існує")]
  EmailTaken,
  #[error("Помилка автентифікації: {0}")]
  Internal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("некоректний шлях до файлу: {0}")]
  InvalidPath(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
  #[error("Повідомлення не може бути порожнім")]
  EmptyMessage,
  #[error("Файл завеликий: максимальний розмір {} МБ", .max / MIB)]
  FileTooLarge { size: usize, max: usize },
  #[error("Спочатку увійдіть у систему")]
  NotSignedIn,
  #[error("Лише організатор може змінювати або видаляти повідомлення")]
  OrganizerRequired,
  #[error("Повідомлення не знайдено")]
  NotFound,
  #[error(transparent)]
  Auth(#[from] AuthError),
  #[error("Не вдалося завантажити файл: {0}")]
  Storage(#[from] StorageError),
  #[error("Помилка бази даних: {0}")]
  Repository(String),
}

/// Realtime feed item, pushed to WebSocket subscribers.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
  Inserted { message: ChatMessage },
  Updated { message: ChatMessage },
  Deleted { id: Uuid },
  Cleared { count: usize },
}

#[derive(Clone)]
pub struct ChatService {
  messages: Arc<dyn MessageRepository>,
  storage: Arc<dyn ObjectStorage>,
  events: broadcast::Sender<ChatEvent>,
  max_upload_bytes: usize,
  history_limit: usize,
}

impl ChatService {
  pub fn new(
    messages: Arc<dyn MessageRepository>,
    storage: Arc<dyn ObjectStorage>,
    max_upload_bytes: usize,
    history_limit: usize,
  ) -> Self {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    Self { messages, storage, events, max_upload_bytes, history_limit }
  }

  pub fn max_upload_bytes(&self) -> usize {
    self.max_upload_bytes
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
    self.events.subscribe()
  }

  fn publish(&self, event: ChatEvent) {
    // No subscribers is fine.
    let _ = self.events.send(event);
  }

  pub async fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
    self.messages.list(self.history_limit).await
  }

  /// Anonymous visitors may pass their own display name.
  #[instrument(level = "info", skip_all, fields(content_len = content.len(), signed_in = session.is_some()))]
  pub async fn send_message(
    &self,
    session: Option<&Session>,
    content: &str,
    display_name: Option<&str>,
  ) -> Result<ChatMessage, ChatError> {
    let content = content.trim();
    if content.is_empty() {
      return Err(ChatError::EmptyMessage);
    }
    let kind = if is_link(content) { MessageKind::Link } else { MessageKind::Text };
    let message = self.new_message(session, content.to_string(), kind, None, display_name);
    let message = self.messages.insert(message).await?;
    info!(target: "chat", id = %message.id, kind = ?message.kind, "Message sent");
    self.publish(ChatEvent::Inserted { message: message.clone() });
    Ok(message)
  }

  /// Stores the file and posts a `file` message pointing at its public URL.
  /// The size ceiling is checked before storage is touched.
  #[instrument(level = "info", skip_all, fields(size = bytes.len(), signed_in = session.is_some()))]
  pub async fn upload_file(
    &self,
    session: Option<&Session>,
    file_name: &str,
    bytes: &[u8],
    display_name: Option<&str>,
  ) -> Result<ChatMessage, ChatError> {
    if bytes.len() > self.max_upload_bytes {
      warn!(target: "chat", size = bytes.len(), max = self.max_upload_bytes, "Upload refused: too large");
      return Err(ChatError::FileTooLarge { size: bytes.len(), max: self.max_upload_bytes });
    }

    let sender = session.map(|s| s.user.id);
    let path = object_path(sender, Utc::now().timestamp_millis(), file_name);
    self.storage.upload(&path, bytes).await?;
    let url = self.storage.public_url(&path);

    let name = file_name.trim();
    let content = if name.is_empty() { path.clone() } else { name.to_string() };
    let message = self.new_message(session, content, MessageKind::File, Some(url), display_name);
    let message = self.messages.insert(message).await?;
    info!(target: "chat", id = %message.id, %path, "File message sent");
    self.publish(ChatEvent::Inserted { message: message.clone() });
    Ok(message)
  }

  #[instrument(level = "info", skip(self, session, content), fields(content_len = content.len()))]
  pub async fn edit_message(&self, session: Option<&Session>, id: Uuid, content: &str) -> Result<ChatMessage, ChatError> {
    require_organizer(session)?;
    let content = content.trim();
    if content.is_empty() {
      return Err(ChatError::EmptyMessage);
    }
    let message = self.messages.update_content(id, content).await?.ok_or(ChatError::NotFound)?;
    self.publish(ChatEvent::Updated { message: message.clone() });
    Ok(message)
  }

  #[instrument(level = "info", skip(self, session))]
  pub async fn delete_message(&self, session: Option<&Session>, id: Uuid) -> Result<(), ChatError> {
    require_organizer(session)?;
    if !self.messages.delete(id).await? {
      return Err(ChatError::NotFound);
    }
    self.publish(ChatEvent::Deleted { id });
    Ok(())
  }

  #[instrument(level = "info", skip_all)]
  pub async fn delete_all(&self, session: Option<&Session>) -> Result<usize, ChatError> {
    require_organizer(session)?;
    let count = self.messages.delete_all().await?;
    info!(target: "chat", count, "Chat cleared");
    self.publish(ChatEvent::Cleared { count });
    Ok(count)
  }

  fn new_message(
    &self,
    session: Option<&Session>,
    content: String,
    kind: MessageKind,
    file_url: Option<String>,
    display_name: Option<&str>,
  ) -> ChatMessage {
    let display_name = match session {
      Some(s) => Some(display_name_of(&s.user)),
      None => display_name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
    };
    ChatMessage {
      id: Uuid::new_v4(),
      sender_id: session.map(|s| s.user.id),
      content,
      kind,
      file_url,
      created_at: Utc::now(),
      display_name,
    }
  }
}

fn require_organizer(session: Option<&Session>) -> Result<&User, ChatError> {
  let user = &session.ok_or(ChatError::NotSignedIn)?.user;
  if !user.is_organizer() {
    return Err(ChatError::OrganizerRequired);
  }
  Ok(user)
}

fn display_name_of(user: &User) -> String {
  user
    .display_name
    .clone()
    .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_string())
}

/// A single absolute http(s) URL with no surrounding text.
pub fn is_link(content: &str) -> bool {
  if content.chars().any(char::is_whitespace) {
    return false;
  }
  url::Url::parse(content)
    .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
    .unwrap_or(false)
}

/// `chat-files/{senderId|anonymous}-{timestamp}.{ext}`
pub fn object_path(sender: Option<Uuid>, timestamp_ms: i64, file_name: &str) -> String {
  let owner = sender.map(|id| id.to_string()).unwrap_or_else(|| "anonymous".to_string());
  format!("chat-files/{owner}-{timestamp_ms}.{}", extension_of(file_name))
}

fn extension_of(file_name: &str) -> String {
  Path::new(file_name.trim())
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_ascii_lowercase())
    .filter(|e| !e.is_empty())
    .unwrap_or_else(|| "bin".to_string())
}
