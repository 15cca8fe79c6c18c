//! In-memory messages table.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ChatMessage;

use super::ports::MessageRepository;
use super::ChatError;

/// Rows are kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryMessages {
  rows: Arc<RwLock<Vec<ChatMessage>>>,
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessages {
  async fn list(&self, limit: usize) -> Result<Vec<ChatMessage>, ChatError> {
    let rows = self.rows.read().await;
    let skip = rows.len().saturating_sub(limit);
    Ok(rows[skip..].to_vec())
  }

  async fn insert(&self, message: ChatMessage) -> Result<ChatMessage, ChatError> {
    let mut rows = self.rows.write().await;
    if rows.iter().any(|m| m.id == message.id) {
      return Err(ChatError::Repository(format!("duplicate id {}", message.id)));
    }
    rows.push(message.clone());
    Ok(message)
  }

  async fn update_content(&self, id: Uuid, content: &str) -> Result<Option<ChatMessage>, ChatError> {
    let mut rows = self.rows.write().await;
    Ok(rows.iter_mut().find(|m| m.id == id).map(|m| {
      m.content = content.to_string();
      m.clone()
    }))
  }

  async fn delete(&self, id: Uuid) -> Result<bool, ChatError> {
    let mut rows = self.rows.write().await;
    let before = rows.len();
    rows.retain(|m| m.id != id);
    Ok(rows.len() != before)
  }

  async fn delete_all(&self) -> Result<usize, ChatError> {
    let mut rows = self.rows.write().await;
    let n = rows.len();
    rows.clear();
    Ok(n)
  }
}
