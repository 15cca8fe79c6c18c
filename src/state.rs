//! Application state: content banks, chat service and its backend adapters,
//! theme store, mission runs and the assistant.
//!
//! This module owns:
//!   - lesson sections and the quiz bank (seeds + config)
//!   - the chat service wired to in-memory auth/messages and disk storage
//!   - the theme store
//!   - the mission service

use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{info, instrument};

use crate::assistant::Assistant;
use crate::chat::auth::InMemoryAuth;
use crate::chat::messages::InMemoryMessages;
use crate::chat::ports::AuthProvider;
use crate::chat::storage::LocalDiskStorage;
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::domain::{LessonSection, QuizItem, Session};
use crate::mission::MissionService;
use crate::quiz::build_bank;
use crate::seeds::{lesson_sections, quiz_bank};
use crate::theme::{FixedPreference, JsonFileStorage, MemoryStorage, PreferenceStorage, ThemeState, ThemeStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub lessons: Arc<Vec<LessonSection>>,
    pub quizzes: Arc<Vec<QuizItem>>,
    pub auth: Arc<dyn AuthProvider>,
    pub chat: ChatService,
    pub theme: Arc<ThemeStore>,
    pub missions: MissionService,
    pub assistant: Assistant,
}

impl AppState {
    /// Build state from config with the default adapters. An empty theme
    /// storage path keeps the theme in memory only.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: AppConfig) -> Self {
        let path = &config.theme.storage_path;
        let theme_storage: Box<dyn PreferenceStorage> = if path.as_os_str().is_empty() {
            Box::<MemoryStorage>::default()
        } else {
            Box::new(JsonFileStorage::new(path.clone()))
        };
        Self::with_theme_storage(config, theme_storage)
    }

    pub fn with_theme_storage(config: AppConfig, theme_storage: Box<dyn PreferenceStorage>) -> Self {
        let quizzes = build_bank(quiz_bank(), &config.quizzes);
        info!(target: "zirka_backend", quizzes = quizzes.len(), organizers = config.chat.organizers.len(), "Content loaded");

        let auth: Arc<dyn AuthProvider> = Arc::new(InMemoryAuth::new(&config.chat.organizers));
        let storage = Arc::new(LocalDiskStorage::new(
            config.chat.storage_dir.clone(),
            config.chat.public_base_url.clone(),
        ));
        let chat = ChatService::new(
            Arc::new(InMemoryMessages::default()),
            storage,
            config.chat.max_upload_bytes,
            config.chat.history_limit,
        );

        let theme = Arc::new(ThemeStore::load(
            theme_storage,
            Box::new(FixedPreference(config.theme.system_preference)),
        ));
        info!(target: "theme", mode = theme.mode().as_str(), "Theme store ready");

        Self {
            missions: MissionService::new(config.mission.clone()),
            assistant: Assistant::new(&config.assistant),
            config: Arc::new(config),
            lessons: Arc::new(lesson_sections()),
            quizzes: Arc::new(quizzes),
            auth,
            chat,
            theme,
        }
    }

    /// Run a theme change on the blocking pool; file storage saves synchronously.
    pub async fn dispatch_theme<F>(&self, change: F) -> Result<ThemeState, JoinError>
    where
        F: FnOnce(&ThemeStore) -> ThemeState + Send + 'static,
    {
        let theme = self.theme.clone();
        tokio::task::spawn_blocking(move || change(&theme)).await
    }

    pub fn find_quiz(&self, id: &str) -> Option<&QuizItem> {
        self.quizzes.iter().find(|q| q.id == id)
    }

    /// Session for a bearer token; lookup failures count as signed out.
    pub async fn session_for(&self, token: Option<&str>) -> Option<Session> {
        let token = token?;
        match self.auth.session(token).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(target: "chat", error = %e, "Session lookup failed");
                None
            }
        }
    }
}
