//! Theme store: the selected mode, the resolved light/dark theme, persistence
//! and change listeners.
//!
//! The store is an explicit object owned by `AppState`. Mode transitions go
//! through the pure `reduce` function; the store persists the new mode under
//! `STORAGE_KEY` and then notifies listeners synchronously, in registration
//! order, exactly once per change.
//!
//! Dispatches are serialized end to end, so the persisted mode and the last
//! state a listener saw always match the in-memory mode. `JsonFileStorage`
//! writes with blocking I/O; async callers dispatch via `spawn_blocking`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::domain::{ActualTheme, ThemeMode};

pub const STORAGE_KEY: &str = "theme-mode";

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
  #[error("не вдалося зберегти тему: {0}")]
  Io(#[from] std::io::Error),
  #[error("пошкоджений файл налаштувань: {0}")]
  Corrupt(#[from] serde_json::Error),
}

/// Host environment light/dark preference.
pub trait HostPreference: Send + Sync {
  fn prefers_dark(&self) -> bool;
}

/// Preference fixed at startup (config / SYSTEM_THEME), or taken from a request header.
#[derive(Clone, Copy, Debug)]
pub struct FixedPreference(pub ActualTheme);

impl HostPreference for FixedPreference {
  fn prefers_dark(&self) -> bool {
    self.0 == ActualTheme::Dark
  }
}

/// Key/value device storage.
pub trait PreferenceStorage: Send + Sync {
  fn load(&self, key: &str) -> Result<Option<String>, ThemeError>;
  fn save(&self, key: &str, value: &str) -> Result<(), ThemeError>;
}

/// All keys live in one JSON object on disk.
pub struct JsonFileStorage {
  path: PathBuf,
}

impl JsonFileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  fn read_all(&self) -> Result<HashMap<String, String>, ThemeError> {
    match std::fs::read_to_string(&self.path) {
      Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
      Ok(raw) => Ok(serde_json::from_str(&raw)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
      Err(e) => Err(e.into()),
    }
  }
}

impl PreferenceStorage for JsonFileStorage {
  fn load(&self, key: &str) -> Result<Option<String>, ThemeError> {
    Ok(self.read_all()?.remove(key))
  }

  fn save(&self, key: &str, value: &str) -> Result<(), ThemeError> {
    let mut all = self.read_all().unwrap_or_default();
    all.insert(key.to_string(), value.to_string());
    if let Some(dir) = self.path.parent() {
      std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&self.path, serde_json::to_vec_pretty(&all)?)?;
    Ok(())
  }
}

#[derive(Default)]
pub struct MemoryStorage {
  map: Mutex<HashMap<String, String>>,
}

impl PreferenceStorage for MemoryStorage {
  fn load(&self, key: &str) -> Result<Option<String>, ThemeError> {
    Ok(lock(&self.map).get(key).cloned())
  }

  fn save(&self, key: &str, value: &str) -> Result<(), ThemeError> {
    lock(&self.map).insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeAction {
  Set(ThemeMode),
  Toggle,
}

/// Next mode. `Toggle` flips light/dark; from cosmic or system it flips the
/// currently applied theme.
pub fn reduce(mode: ThemeMode, actual: ActualTheme, action: ThemeAction) -> ThemeMode {
  match action {
    ThemeAction::Set(m) => m,
    ThemeAction::Toggle => match mode {
      ThemeMode::Light => ThemeMode::Dark,
      ThemeMode::Dark => ThemeMode::Light,
      ThemeMode::Cosmic | ThemeMode::System => match actual {
        ActualTheme::Light => ThemeMode::Dark,
        ActualTheme::Dark => ThemeMode::Light,
      },
    },
  }
}

/// Collapse a mode into the applied theme. Cosmic is a dark palette.
pub fn resolve(mode: ThemeMode, host: &dyn HostPreference) -> ActualTheme {
  match mode {
    ThemeMode::Light => ActualTheme::Light,
    ThemeMode::Dark | ThemeMode::Cosmic => ActualTheme::Dark,
    ThemeMode::System => {
      if host.prefers_dark() { ActualTheme::Dark } else { ActualTheme::Light }
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ThemeState {
  pub mode: ThemeMode,
  pub actual: ActualTheme,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Arc<dyn Fn(&ThemeState) + Send + Sync>;

struct Inner {
  mode: ThemeMode,
  listeners: Vec<(SubscriptionId, Listener)>,
  next_id: u64,
}

pub struct ThemeStore {
  inner: Mutex<Inner>,
  /// Held across reduce, save and notify.
  dispatch_gate: Mutex<()>,
  storage: Box<dyn PreferenceStorage>,
  host: Box<dyn HostPreference>,
}

impl ThemeStore {
  /// Read the persisted mode; missing or unknown values mean `System`.
  pub fn load(storage: Box<dyn PreferenceStorage>, host: Box<dyn HostPreference>) -> Self {
    let mode = match storage.load(STORAGE_KEY) {
      Ok(Some(v)) => ThemeMode::parse(&v).unwrap_or_default(),
      Ok(None) => ThemeMode::default(),
      Err(e) => {
        error!(target: "theme", error = %e, "Failed to read persisted theme; using system");
        ThemeMode::default()
      }
    };
    debug!(target: "theme", mode = mode.as_str(), "Theme store loaded");
    Self {
      inner: Mutex::new(Inner { mode, listeners: Vec::new(), next_id: 0 }),
      dispatch_gate: Mutex::new(()),
      storage,
      host,
    }
  }

  pub fn mode(&self) -> ThemeMode {
    lock(&self.inner).mode
  }

  pub fn actual_theme(&self) -> ActualTheme {
    resolve(self.mode(), self.host.as_ref())
  }

  pub fn state(&self) -> ThemeState {
    let mode = self.mode();
    ThemeState { mode, actual: resolve(mode, self.host.as_ref()) }
  }

  /// State as seen by a client whose own light/dark preference is known.
  pub fn state_for(&self, client: &dyn HostPreference) -> ThemeState {
    let mode = self.mode();
    ThemeState { mode, actual: resolve(mode, client) }
  }

  pub fn set_theme(&self, mode: ThemeMode) -> ThemeState {
    self.dispatch(ThemeAction::Set(mode))
  }

  pub fn toggle(&self) -> ThemeState {
    self.dispatch(ThemeAction::Toggle)
  }

  /// Listeners must not dispatch from inside the callback.
  #[instrument(level = "debug", skip(self), target = "theme")]
  pub fn dispatch(&self, action: ThemeAction) -> ThemeState {
    let _serial = lock(&self.dispatch_gate);
    let (state, listeners) = {
      let mut inner = lock(&self.inner);
      let actual = resolve(inner.mode, self.host.as_ref());
      inner.mode = reduce(inner.mode, actual, action);
      let state = ThemeState { mode: inner.mode, actual: resolve(inner.mode, self.host.as_ref()) };
      let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
      (state, listeners)
    };

    if let Err(e) = self.storage.save(STORAGE_KEY, state.mode.as_str()) {
      error!(target: "theme", error = %e, "Failed to persist theme mode");
    }

    // Listeners run outside the lock so they may read the store.
    for l in &listeners {
      l(&state);
    }
    debug!(target: "theme", mode = state.mode.as_str(), actual = state.actual.as_str(), listeners = listeners.len(), "Theme changed");
    state
  }

  pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
    let mut inner = lock(&self.inner);
    let id = SubscriptionId(inner.next_id);
    inner.next_id += 1;
    inner.listeners.push((id, listener));
    id
  }

  /// Returns false if the id was not registered.
  pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
    let mut inner = lock(&self.inner);
    let before = inner.listeners.len();
    inner.listeners.retain(|(lid, _)| *lid != id);
    inner.listeners.len() != before
  }

  #[cfg(test)]
  pub fn listener_count(&self) -> usize {
    lock(&self.inner).listeners.len()
  }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
