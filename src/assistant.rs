//! The assistant endpoint's behaviour: validate the query, wait the configured
//! delay, echo a canned reply. No matching or scoring happens here.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::AssistantCfg;
use crate::util::{fill_template, trunc_for_log};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssistantError {
  #[error("Invalid JSON body: {0}")]
  InvalidBody(String),
  #[error("Query is required")]
  EmptyQuery,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
  #[serde(default)]
  pub query: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Assistant {
  reply_template: String,
  delay: Duration,
}

impl Assistant {
  pub fn new(cfg: &AssistantCfg) -> Self {
    Self { reply_template: cfg.reply_template.clone(), delay: Duration::from_millis(cfg.delay_ms) }
  }

  /// Parse a raw request body into the query string.
  pub fn parse(body: &[u8]) -> Result<String, AssistantError> {
    let req: AssistantRequest =
      serde_json::from_slice(body).map_err(|e| AssistantError::InvalidBody(e.to_string()))?;
    match req.query {
      Some(q) if !q.trim().is_empty() => Ok(q.trim().to_string()),
      _ => Err(AssistantError::EmptyQuery),
    }
  }

  #[instrument(level = "info", skip_all, fields(query_len = query.len()))]
  pub async fn reply(&self, query: &str) -> String {
    tokio::time::sleep(self.delay).await;
    info!(target: "assistant", query = %trunc_for_log(query, 80), "Assistant replied");
    fill_template(&self.reply_template, &[("query", query)])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_accepts_query_and_rejects_garbage() {
    assert_eq!(Assistant::parse(r#"{"query":"  що таке div? "}"#.as_bytes()), Ok("що таке div?".into()));
    assert_eq!(Assistant::parse(br#"{"query":"   "}"#), Err(AssistantError::EmptyQuery));
    assert_eq!(Assistant::parse(br#"{}"#), Err(AssistantError::EmptyQuery));
    assert!(matches!(Assistant::parse(b"not json"), Err(AssistantError::InvalidBody(_))));
  }

  #[tokio::test(start_paused = true)]
  async fn reply_echoes_after_delay() {
    let a = Assistant::new(&AssistantCfg { reply_template: "Echo: {query}".into(), delay_ms: 1500 });
    let started = tokio::time::Instant::now();
    let text = a.reply("margin").await;
    assert_eq!(text, "Echo: margin");
    assert!(started.elapsed() >= Duration::from_millis(1500));
  }
}
