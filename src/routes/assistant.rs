//! The assistant function endpoint: `POST` with `{ "query": string }`,
//! `OPTIONS` for CORS preflight.

use axum::{
  body::Bytes,
  extract::State,
  http::{header, HeaderValue, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use tracing::{instrument, warn};

use crate::assistant::Assistant;
use crate::state::AppState;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn with_cors(mut res: Response) -> Response {
  let h = res.headers_mut();
  h.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
  h.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
  h.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
  res
}

pub async fn assistant_preflight() -> Response {
  with_cors((StatusCode::OK, "ok").into_response())
}

#[instrument(level = "info", skip_all, fields(body_len = body.len()))]
pub async fn assistant_query(State(state): State<AppState>, body: Bytes) -> Response {
  let res = match Assistant::parse(&body) {
    Ok(query) => {
      let message = state.assistant.reply(&query).await;
      (StatusCode::OK, Json(json!({ "message": message }))).into_response()
    }
    Err(e) => {
      warn!(target: "assistant", error = %e, "Assistant request rejected");
      (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
    }
  };
  with_cors(res)
}
