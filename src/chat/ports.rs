//! Ports between the chat service and the hosted backend.
//!
//! The service only talks to these traits. Adapters live next to them
//! (in-memory auth/messages, local-disk storage).

use uuid::Uuid;

use crate::domain::{ChatMessage, Session};

use super::{AuthError, ChatError, StorageError};

/// Authentication: sign in/up/out and session lookup.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
  async fn sign_up(&self, email: &str, password: &str, display_name: Option<&str>) -> Result<Session, AuthError>;

  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

  /// Signing out an unknown token is not an error.
  async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

  async fn session(&self, token: &str) -> Result<Option<Session>, AuthError>;
}

/// The messages table.
#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
  /// Most recent `limit` messages, oldest first.
  async fn list(&self, limit: usize) -> Result<Vec<ChatMessage>, ChatError>;

  async fn insert(&self, message: ChatMessage) -> Result<ChatMessage, ChatError>;

  /// `None` when no row has this id.
  async fn update_content(&self, id: Uuid, content: &str) -> Result<Option<ChatMessage>, ChatError>;

  /// False when no row has this id.
  async fn delete(&self, id: Uuid) -> Result<bool, ChatError>;

  /// Number of rows removed.
  async fn delete_all(&self) -> Result<usize, ChatError>;
}

/// Object storage bucket.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
  async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

  fn public_url(&self, path: &str) -> String;
}
