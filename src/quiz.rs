//! Quiz bank assembly and answer checking.

use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::config::QuizCfg;
use crate::domain::QuizItem;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizVerdict {
  pub correct: bool,
  pub message: String,
  pub answer: String,
}

pub fn check_answer(item: &QuizItem, selected: &str) -> QuizVerdict {
  let correct = selected.trim() == item.answer;
  let message = if correct {
    "Правильно! Молодець!".to_string()
  } else {
    format!("Неправильно. Правильна відповідь: {}", item.answer)
  };
  QuizVerdict { correct, message, answer: item.answer.clone() }
}

/// Running tally over several answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuizScore {
  pub correct: u32,
  pub total: u32,
}

impl QuizScore {
  pub fn record(&mut self, verdict: &QuizVerdict) {
    self.total += 1;
    if verdict.correct {
      self.correct += 1;
    }
  }

  pub fn percent(&self) -> u32 {
    if self.total == 0 { 0 } else { self.correct * 100 / self.total }
  }
}

/// Built-in items followed by well-formed config items. Malformed or
/// duplicate-id entries are skipped.
pub fn build_bank(seeds: Vec<QuizItem>, extra: &[QuizCfg]) -> Vec<QuizItem> {
  let mut bank = seeds;
  for cfg in extra {
    let item = QuizItem {
      id: cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
      question: cfg.question.clone(),
      options: cfg.options.clone(),
      answer: cfg.answer.clone(),
    };
    if !item.is_well_formed() {
      error!(target: "quiz", id = %item.id, "Skipping quiz item: answer missing from options or empty question");
      continue;
    }
    if bank.iter().any(|q| q.id == item.id) {
      error!(target: "quiz", id = %item.id, "Skipping quiz item: duplicate id");
      continue;
    }
    bank.push(item);
  }
  bank
}
