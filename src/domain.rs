//! Domain models used by the backend: quiz items, lesson sections, chat messages,
//! users/sessions and theme values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One multiple-choice question. The answer is always one of the options.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizItem {
  pub id: String,
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
}

impl QuizItem {
  /// Required fields present and the answer is among the options.
  pub fn is_well_formed(&self) -> bool {
    !self.question.trim().is_empty()
      && !self.options.is_empty()
      && self.options.iter().any(|o| o == &self.answer)
  }
}

/// A section of lesson text (HTML or CSS basics).
#[derive(Clone, Debug, Serialize)]
pub struct LessonSection {
  pub id: &'static str,
  pub topic: &'static str,
  pub title: &'static str,
  pub body: &'static str,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
  Text,
  File,
  Link,
}

/// Chat message as stored in the messages table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
  pub id: Uuid,
  /// `None` for anonymous visitors.
  pub sender_id: Option<Uuid>,
  pub content: String,
  pub kind: MessageKind,
  #[serde(default)]
  pub file_url: Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub display_name: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  Member,
  Organizer,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub display_name: Option<String>,
  pub role: Role,
}

impl User {
  pub fn is_organizer(&self) -> bool {
    self.role == Role::Organizer
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct Session {
  pub token: String,
  pub user: User,
  pub created_at: DateTime<Utc>,
}

/// Mode chosen by the user.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
  Light,
  Dark,
  Cosmic,
  #[default]
  System,
}

impl ThemeMode {
  pub fn as_str(self) -> &'static str {
    match self {
      ThemeMode::Light => "light",
      ThemeMode::Dark => "dark",
      ThemeMode::Cosmic => "cosmic",
      ThemeMode::System => "system",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "light" => Some(ThemeMode::Light),
      "dark" => Some(ThemeMode::Dark),
      "cosmic" => Some(ThemeMode::Cosmic),
      "system" => Some(ThemeMode::System),
      _ => None,
    }
  }
}

/// The light/dark value actually applied after collapsing `System`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActualTheme {
  Light,
  Dark,
}

impl ActualTheme {
  pub fn as_str(self) -> &'static str {
    match self {
      ActualTheme::Light => "light",
      ActualTheme::Dark => "dark",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "light" => Some(ActualTheme::Light),
      "dark" => Some(ActualTheme::Dark),
      _ => None,
    }
  }
}
