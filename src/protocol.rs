//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::chat::ChatEvent;
use crate::domain::{QuizItem, Session, ThemeMode, User};
use crate::quiz::{QuizScore, QuizVerdict};
use crate::search::SearchHit;
use crate::theme::ThemeState;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SendMessage {
        content: String,
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
    },
    SetTheme {
        mode: ThemeMode,
    },
    ToggleTheme,
    CheckAnswer {
        #[serde(rename = "quizId")]
        quiz_id: String,
        answer: String,
    },
}

/// Messages the server sends over WebSocket, both replies and pushed events.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Chat {
        #[serde(flatten)]
        event: ChatEvent,
    },
    Theme {
        #[serde(flatten)]
        state: ThemeState,
    },
    QuizResult {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(flatten)]
        verdict: QuizVerdict,
        /// Tally for this connection.
        score: QuizScore,
    },
    Error {
        message: String,
    },
}

/// Quiz item without its answer.
#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
}

pub fn quiz_out(q: &QuizItem) -> QuizOut {
    QuizOut { id: q.id.clone(), question: q.question.clone(), options: q.options.clone() }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "quizId")]
    pub quiz_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchOut {
    pub query: String,
    pub terms: Vec<String>,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeIn {
    pub mode: ThemeMode,
}

#[derive(Debug, Deserialize)]
pub struct MissionSubmitIn {
    pub css: String,
}

#[derive(Deserialize)]
pub struct SignUpIn {
    pub email: String,
    pub password: String,
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInIn {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionOut {
    pub token: String,
    pub user: User,
}

impl From<Session> for SessionOut {
    fn from(s: Session) -> Self {
        Self { token: s.token, user: s.user }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessageIn {
    pub content: String,
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageIn {
    pub content: String,
}

#[derive(Serialize)]
pub struct ClearedOut {
    pub count: usize,
}

#[derive(Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
