//! Loading application configuration from TOML.
//!
//! Every section is optional; omitted keys take the defaults below. See
//! `AppConfig` for the expected schema.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::ActualTheme;

/// 25 MiB, the client-side ceiling for chat attachments.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read { path: String, source: std::io::Error },
  #[error("failed to parse {path}: {source}")]
  Parse { path: String, source: toml::de::Error },
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub assistant: AssistantCfg,
  #[serde(default)]
  pub chat: ChatCfg,
  #[serde(default)]
  pub theme: ThemeCfg,
  #[serde(default)]
  pub mission: MissionCfg,
  /// Extra quiz items appended to the built-in bank.
  #[serde(default)]
  pub quizzes: Vec<QuizCfg>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AssistantCfg {
  /// `{query}` is replaced with the user's question.
  pub reply_template: String,
  pub delay_ms: u64,
}

impl Default for AssistantCfg {
  fn default() -> Self {
    Self {
      reply_template: "Ти запитав: «{query}». Я ще вчуся, але скоро допоможу з HTML та CSS!".into(),
      delay_ms: 1000,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChatCfg {
  pub max_upload_bytes: usize,
  pub storage_dir: PathBuf,
  pub public_base_url: String,
  /// E-mails that receive the organizer role on sign-up.
  pub organizers: Vec<String>,
  pub history_limit: usize,
}

impl Default for ChatCfg {
  fn default() -> Self {
    Self {
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      storage_dir: PathBuf::from("./uploads"),
      public_base_url: "/files".into(),
      organizers: Vec::new(),
      history_limit: 200,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThemeCfg {
  pub storage_path: PathBuf,
  pub system_preference: ActualTheme,
}

impl Default for ThemeCfg {
  fn default() -> Self {
    Self {
      storage_path: PathBuf::from("./data/preferences.json"),
      system_preference: ActualTheme::Light,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MissionCfg {
  pub bubble_ttl_ms: u64,
  pub energy_per_stage: u8,
  pub stage_seconds: u64,
  /// Runs idle this long are dropped when a new run starts.
  pub run_ttl_secs: u64,
}

impl Default for MissionCfg {
  fn default() -> Self {
    Self { bubble_ttl_ms: 4000, energy_per_stage: 25, stage_seconds: 180, run_ttl_secs: 3600 }
  }
}

/// Quiz entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  #[serde(default)]
  pub id: Option<String>,
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
  let display = path.display().to_string();
  let raw = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::Read { path: display.clone(), source })?;
  toml::from_str::<AppConfig>(&raw).map_err(|source| ConfigError::Parse { path: display, source })
}

/// Load from APP_CONFIG_PATH, then apply env overrides (SYSTEM_THEME).
/// Any IO/parse error is logged and defaults are used instead.
pub fn load_from_env() -> AppConfig {
  let mut cfg = match std::env::var("APP_CONFIG_PATH") {
    Ok(path) => match load_from_path(Path::new(&path)) {
      Ok(cfg) => {
        info!(target: "zirka_backend", %path, "Loaded app config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "zirka_backend", error = %e, "Config unusable; falling back to defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };

  if let Some(pref) = std::env::var("SYSTEM_THEME").ok().as_deref().and_then(ActualTheme::parse) {
    cfg.theme.system_preference = pref;
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.chat.max_upload_bytes, 26_214_400);
    assert_eq!(cfg.assistant.delay_ms, 1000);
    assert_eq!(cfg.theme.system_preference, ActualTheme::Light);
    assert!(cfg.quizzes.is_empty());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg: AppConfig = toml::from_str(
      r#"
      [chat]
      organizers = ["mentor@school.ua"]

      [theme]
      system_preference = "dark"

      [[quizzes]]
      question = "Який тег для посилання?"
      options = ["<a>", "<p>"]
      answer = "<a>"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.chat.organizers, vec!["mentor@school.ua".to_string()]);
    assert_eq!(cfg.chat.history_limit, 200);
    assert_eq!(cfg.theme.system_preference, ActualTheme::Dark);
    assert_eq!(cfg.quizzes.len(), 1);
  }

  #[test]
  fn broken_file_reports_parse_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(f, "[chat\nmax_upload_bytes = ").unwrap();
    assert!(matches!(load_from_path(f.path()), Err(ConfigError::Parse { .. })));
    assert!(matches!(
      load_from_path(Path::new("/definitely/not/here.toml")),
      Err(ConfigError::Read { .. })
    ));
  }
}
