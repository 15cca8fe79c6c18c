//! HTTP endpoint handlers for content, search, theme and the cosmic mission.
//! Thin wrappers that forward to the modules holding the behaviour.

use axum::{
  extract::{Path, Query, State},
  http::HeaderMap,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::ActualTheme;
use crate::error::ApiError;
use crate::mission::{MissionSnapshot, StageOut, SubmitOutcome};
use crate::protocol::*;
use crate::quiz::{check_answer, QuizVerdict};
use crate::search::{expand_query, search};
use crate::state::AppState;
use crate::theme::{FixedPreference, ThemeState};

/// Client hint carrying the browser's light/dark preference.
const PREFERS_COLOR_SCHEME: &str = "sec-ch-prefers-color-scheme";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

pub async fn http_lessons(State(state): State<AppState>) -> impl IntoResponse {
  Json(state.lessons.as_ref().clone())
}

pub async fn http_quizzes(State(state): State<AppState>) -> impl IntoResponse {
  Json(state.quizzes.iter().map(quiz_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state, body), fields(quiz_id = %body.quiz_id))]
pub async fn http_post_answer(
  State(state): State<AppState>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<QuizVerdict>, ApiError> {
  let item = state
    .find_quiz(&body.quiz_id)
    .ok_or_else(|| ApiError::not_found(format!("Питання не знайдено: {}", body.quiz_id)))?;
  let verdict = check_answer(item, &body.answer);
  info!(target: "quiz", id = %item.id, correct = verdict.correct, "Quiz answer checked");
  Ok(Json(verdict))
}

#[instrument(level = "info", skip(state), fields(q_len = q.q.len()))]
pub async fn http_search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> impl IntoResponse {
  let hits = search(&q.q, &state.lessons, &state.quizzes);
  Json(SearchOut { terms: expand_query(&q.q), query: q.q, hits })
}

pub async fn http_get_theme(State(state): State<AppState>, headers: HeaderMap) -> Json<ThemeState> {
  let client = headers
    .get(PREFERS_COLOR_SCHEME)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| ActualTheme::parse(v.trim_matches('"')));
  match client {
    Some(pref) => Json(state.theme.state_for(&FixedPreference(pref))),
    None => Json(state.theme.state()),
  }
}

#[instrument(level = "info", skip(state), fields(mode = body.mode.as_str()))]
pub async fn http_put_theme(State(state): State<AppState>, Json(body): Json<ThemeIn>) -> Result<Json<ThemeState>, ApiError> {
  let mode = body.mode;
  Ok(Json(state.dispatch_theme(move |t| t.set_theme(mode)).await?))
}

pub async fn http_toggle_theme(State(state): State<AppState>) -> Result<Json<ThemeState>, ApiError> {
  Ok(Json(state.dispatch_theme(|t| t.toggle()).await?))
}

pub async fn http_mission_stages(State(state): State<AppState>) -> Json<Vec<StageOut>> {
  Json(state.missions.stages())
}

pub async fn http_start_mission(State(state): State<AppState>) -> Json<MissionSnapshot> {
  Json(state.missions.start().await)
}

pub async fn http_get_mission(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
) -> Result<Json<MissionSnapshot>, ApiError> {
  Ok(Json(state.missions.get(id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%id, css_len = body.css.len()))]
pub async fn http_submit_mission(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
  Json(body): Json<MissionSubmitIn>,
) -> Result<Json<SubmitOutcome>, ApiError> {
  Ok(Json(state.missions.submit(id, &body.css).await?))
}
