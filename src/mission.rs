//! Cosmic mission: a staged CSS lesson with an energy meter.
//!
//! Flow:
//! 1) A run starts at stage 0 with zero energy.
//! 2) The learner submits CSS for the current stage; the declarations are
//!    parsed and compared with the stage's required `property: value` pairs.
//! 3) A complete answer advances the stage and charges the energy meter; the
//!    assistant bubble shows a cheer that disappears after a short while.
//! 4) Finishing the last stage completes the mission at full energy.
//!
//! Runs are kept in memory. Each `start` first drops idle runs, and completed
//! runs once their final bubble has faded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::MissionCfg;
use crate::seeds::{StageDef, CHEERS, MISSION_STAGES};
use crate::transient::{Countdown, TransientText};

pub const MAX_ENERGY: u8 = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MissionError {
  #[error("Місію не знайдено")]
  UnknownRun,
  #[error("Місію вже завершено")]
  AlreadyCompleted,
}

struct MissionRun {
  id: Uuid,
  stage_index: usize,
  energy: u8,
  completed: bool,
  started_at: DateTime<Utc>,
  bubble: TransientText,
  countdown: Countdown,
  last_active: Instant,
}

#[derive(Clone, Debug, Serialize)]
pub struct StageOut {
  pub id: &'static str,
  pub title: &'static str,
  pub briefing: &'static str,
}

impl From<&StageDef> for StageOut {
  fn from(s: &StageDef) -> Self {
    Self { id: s.id, title: s.title, briefing: s.briefing }
  }
}

#[derive(Clone, Debug, Serialize)]
pub struct MissionSnapshot {
  pub id: Uuid,
  pub stage_index: usize,
  pub stage: Option<StageOut>,
  pub total_stages: usize,
  pub progress_percent: u32,
  pub energy: u8,
  pub completed: bool,
  pub started_at: DateTime<Utc>,
  pub bubble: Option<String>,
  pub seconds_left: u64,
  /// The stage timer ran out; the run can still continue.
  pub time_up: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmitOutcome {
  pub accepted: bool,
  pub missing: Vec<String>,
  pub message: String,
  pub run: MissionSnapshot,
}

#[derive(Clone)]
pub struct MissionService {
  runs: Arc<RwLock<HashMap<Uuid, MissionRun>>>,
  stages: &'static [StageDef],
  cfg: MissionCfg,
}

impl MissionService {
  pub fn new(cfg: MissionCfg) -> Self {
    Self::with_stages(cfg, MISSION_STAGES)
  }

  pub fn with_stages(cfg: MissionCfg, stages: &'static [StageDef]) -> Self {
    Self { runs: Arc::new(RwLock::new(HashMap::new())), stages, cfg }
  }

  pub fn stages(&self) -> Vec<StageOut> {
    self.stages.iter().map(StageOut::from).collect()
  }

  #[instrument(level = "info", skip(self))]
  pub async fn start(&self) -> MissionSnapshot {
    let run = MissionRun {
      id: Uuid::new_v4(),
      stage_index: 0,
      energy: 0,
      completed: false,
      started_at: Utc::now(),
      bubble: TransientText::default(),
      countdown: Countdown::start(self.stage_duration()),
      last_active: Instant::now(),
    };
    run.bubble.show("Ракета готова до старту! Виконай перше завдання.", self.bubble_ttl());
    let snap = self.snapshot(&run);
    info!(target: "mission", id = %run.id, "Mission started");
    let mut runs = self.runs.write().await;
    self.evict_stale(&mut runs);
    runs.insert(run.id, run);
    snap
  }

  fn evict_stale(&self, runs: &mut HashMap<Uuid, MissionRun>) {
    let before = runs.len();
    let idle_ttl = Duration::from_secs(self.cfg.run_ttl_secs);
    let done_ttl = self.bubble_ttl();
    runs.retain(|_, r| {
      let idle = r.last_active.elapsed();
      if r.completed { idle < done_ttl } else { idle < idle_ttl }
    });
    let evicted = before - runs.len();
    if evicted > 0 {
      debug!(target: "mission", evicted, remaining = runs.len(), "Stale mission runs evicted");
    }
  }

  #[cfg(test)]
  async fn run_count(&self) -> usize {
    self.runs.read().await.len()
  }

  pub async fn get(&self, id: Uuid) -> Result<MissionSnapshot, MissionError> {
    let runs = self.runs.read().await;
    runs.get(&id).map(|r| self.snapshot(r)).ok_or(MissionError::UnknownRun)
  }

  #[instrument(level = "info", skip(self, css), fields(%id, css_len = css.len()))]
  pub async fn submit(&self, id: Uuid, css: &str) -> Result<SubmitOutcome, MissionError> {
    let mut runs = self.runs.write().await;
    let run = runs.get_mut(&id).ok_or(MissionError::UnknownRun)?;
    if run.completed {
      return Err(MissionError::AlreadyCompleted);
    }

    run.last_active = Instant::now();
    let stage = &self.stages[run.stage_index];
    let missing = missing_declarations(stage, css);
    if !missing.is_empty() {
      let message = format!("Ще не все готово. Бракує: {}", missing.join("; "));
      run.bubble.show("Спробуй ще раз, у тебе вийде!", self.bubble_ttl());
      info!(target: "mission", %id, stage = stage.id, missing = missing.len(), "Stage attempt rejected");
      return Ok(SubmitOutcome { accepted: false, missing, message, run: self.snapshot(run) });
    }

    run.stage_index += 1;
    run.energy = run.energy.saturating_add(self.cfg.energy_per_stage).min(MAX_ENERGY);
    let message = if run.stage_index >= self.stages.len() {
      run.completed = true;
      run.energy = MAX_ENERGY;
      "Місію виконано! Ти справжній космонавт CSS!".to_string()
    } else {
      run.countdown = Countdown::start(self.stage_duration());
      CHEERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Чудово!")
        .to_string()
    };
    run.bubble.show(message.clone(), self.bubble_ttl());
    info!(target: "mission", %id, stage = stage.id, energy = run.energy, completed = run.completed, "Stage completed");

    Ok(SubmitOutcome { accepted: true, missing: Vec::new(), message, run: self.snapshot(run) })
  }

  fn snapshot(&self, run: &MissionRun) -> MissionSnapshot {
    let total = self.stages.len();
    MissionSnapshot {
      id: run.id,
      stage_index: run.stage_index,
      stage: self.stages.get(run.stage_index).map(StageOut::from),
      total_stages: total,
      progress_percent: if total == 0 { 100 } else { (run.stage_index * 100 / total) as u32 },
      energy: run.energy,
      completed: run.completed,
      started_at: run.started_at,
      bubble: run.bubble.current(),
      seconds_left: if run.completed { 0 } else { run.countdown.remaining_secs() },
      time_up: !run.completed && run.countdown.expired(),
    }
  }

  fn bubble_ttl(&self) -> Duration {
    Duration::from_millis(self.cfg.bubble_ttl_ms)
  }

  fn stage_duration(&self) -> Duration {
    Duration::from_secs(self.cfg.stage_seconds)
  }
}

/// `property: value` pairs from a CSS fragment. Comments are dropped, a
/// surrounding `selector { ... }` is unwrapped, property names are
/// lowercased and values are whitespace-normalised.
pub fn parse_declarations(css: &str) -> Vec<(String, String)> {
  let mut body = strip_comments(css);
  if let (Some(open), Some(close)) = (body.find('{'), body.rfind('}')) {
    if open < close {
      body = body[open + 1..close].to_string();
    }
  }

  body
    .split(';')
    .filter_map(|decl| {
      let (prop, value) = decl.split_once(':')?;
      let prop = prop.trim().to_ascii_lowercase();
      let value = normalize_value(value);
      if prop.is_empty() || value.is_empty() { None } else { Some((prop, value)) }
    })
    .collect()
}

fn missing_declarations(stage: &StageDef, css: &str) -> Vec<String> {
  let decls = parse_declarations(css);
  stage
    .required
    .iter()
    .filter(|(p, v)| !decls.iter().any(|(dp, dv)| dp == p && dv == &normalize_value(v)))
    .map(|(p, v)| format!("{p}: {v}"))
    .collect()
}

fn normalize_value(v: &str) -> String {
  v.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

fn strip_comments(css: &str) -> String {
  let mut out = String::with_capacity(css.len());
  let mut rest = css;
  while let Some(start) = rest.find("/*") {
    out.push_str(&rest[..start]);
    match rest[start + 2..].find("*/") {
      Some(end) => rest = &rest[start + 2 + end + 2..],
      None => {
        rest = "";
        break;
      }
    }
  }
  out.push_str(rest);
  out
}
