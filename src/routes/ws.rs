//! WebSocket upgrade + message loop. Client messages are parsed as JSON and
//! answered with one JSON message each; chat and theme events are pushed as
//! they happen. Each connection keeps its own quiz score.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, error, info, instrument};

use crate::domain::Session;
use crate::protocol::{ClientWsMessage, ServerWsMessage, WsQuery};
use crate::quiz::{check_answer, QuizScore};
use crate::state::AppState;
use crate::theme::ThemeState;

#[instrument(level = "info", skip_all)]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<AppState>,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  info!(target: "zirka_backend", "WebSocket upgrade requested");
  let session = state.session_for(q.token.as_deref()).await;
  ws.on_upgrade(move |socket| handle_ws(socket, state, session))
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  match socket.send(Message::Text(out)).await {
    Ok(()) => true,
    Err(e) => {
      error!(target: "zirka_backend", error = %e, "WS send error");
      false
    }
  }
}

#[instrument(level = "info", skip_all, fields(signed_in = session.is_some()))]
async fn handle_ws(mut socket: WebSocket, state: AppState, session: Option<Session>) {
  info!(target: "zirka_backend", "WebSocket connected");
  let mut chat_rx = state.chat.subscribe();
  let (theme_tx, mut theme_rx) = mpsc::unbounded_channel::<ThemeState>();
  let sub = state.theme.subscribe(Arc::new(move |s: &ThemeState| {
    let _ = theme_tx.send(*s);
  }));
  let mut score = QuizScore::default();

  loop {
    let reply = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "zirka_backend", "WS received: {:?}", &msg);
            handle_client_ws(msg, &state, session.as_ref(), &mut score).await
          }
          Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          None
        }
        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
        Some(Ok(_)) => None,
      },
      event = chat_rx.recv() => match event {
        Ok(event) => Some(ServerWsMessage::Chat { event }),
        Err(RecvError::Lagged(n)) => {
          debug!(target: "chat", skipped = n, "WS subscriber lagged");
          None
        }
        Err(RecvError::Closed) => break,
      },
      Some(theme) = theme_rx.recv() => Some(ServerWsMessage::Theme { state: theme }),
    };

    if let Some(msg) = reply {
      if !send(&mut socket, &msg).await {
        break;
      }
    }
  }
  state.theme.unsubscribe(sub);
  info!(target: "zirka_backend", "WebSocket disconnected");
}

/// `None` when the action's outcome arrives through the event feed instead.
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: Option<&Session>,
  score: &mut QuizScore,
) -> Option<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

    ClientWsMessage::SendMessage { content, display_name } => {
      match state.chat.send_message(session, &content, display_name.as_deref()).await {
        Ok(_) => None,
        Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
      }
    }

    ClientWsMessage::SetTheme { mode } => theme_failure(state.dispatch_theme(move |t| t.set_theme(mode)).await),

    ClientWsMessage::ToggleTheme => theme_failure(state.dispatch_theme(|t| t.toggle()).await),

    ClientWsMessage::CheckAnswer { quiz_id, answer } => match state.find_quiz(&quiz_id) {
      Some(item) => {
        let verdict = check_answer(item, &answer);
        score.record(&verdict);
        debug!(target: "quiz", %quiz_id, correct = verdict.correct, percent = score.percent(), "Answer checked");
        Some(ServerWsMessage::QuizResult { verdict, quiz_id, score: *score })
      }
      None => Some(ServerWsMessage::Error { message: format!("Питання не знайдено: {}", quiz_id) }),
    },
  }
}

/// The new state reaches this socket through its theme listener.
fn theme_failure<T>(result: Result<T, tokio::task::JoinError>) -> Option<ServerWsMessage> {
  match result {
    Ok(_) => None,
    Err(e) => {
      error!(target: "theme", error = %e, "Theme change task failed");
      Some(ServerWsMessage::Error { message: "Не вдалося змінити тему".into() })
    }
  }
}
