//! Short-lived UI state kept on the server: the assistant bubble text and the
//! stage countdown.
//!
//! Showing a new bubble aborts the pending clear timer and schedules a fresh
//! one, so an older timer can never wipe a newer message.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Default)]
struct Slot {
  text: Option<String>,
  timer: Option<JoinHandle<()>>,
  generation: u64,
}

#[derive(Clone, Default)]
pub struct TransientText {
  slot: Arc<Mutex<Slot>>,
}

impl TransientText {
  /// Must be called from within a Tokio runtime.
  pub fn show(&self, text: impl Into<String>, ttl: Duration) {
    let mut slot = lock(&self.slot);
    if let Some(prev) = slot.timer.take() {
      prev.abort();
    }
    slot.generation += 1;
    slot.text = Some(text.into());

    let generation = slot.generation;
    let weak = Arc::downgrade(&self.slot);
    slot.timer = Some(tokio::spawn(async move {
      tokio::time::sleep(ttl).await;
      if let Some(slot) = weak.upgrade() {
        let mut slot = lock(&slot);
        if slot.generation == generation {
          slot.text = None;
          slot.timer = None;
        }
      }
    }));
  }

  pub fn current(&self) -> Option<String> {
    lock(&self.slot).text.clone()
  }
}

/// Seconds left until a deadline, saturating at zero.
#[derive(Clone, Copy, Debug)]
pub struct Countdown {
  deadline: Instant,
}

impl Countdown {
  pub fn start(duration: Duration) -> Self {
    Self { deadline: Instant::now() + duration }
  }

  pub fn remaining_secs(&self) -> u64 {
    self.deadline.saturating_duration_since(Instant::now()).as_secs()
  }

  pub fn expired(&self) -> bool {
    Instant::now() >= self.deadline
  }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn text_clears_after_ttl() {
    let t = TransientText::default();
    t.show("Привіт!", Duration::from_secs(2));
    assert_eq!(t.current().as_deref(), Some("Привіт!"));
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(t.current(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn new_text_replaces_pending_timer() {
    let t = TransientText::default();
    t.show("перше", Duration::from_secs(2));
    tokio::time::sleep(Duration::from_secs(1)).await;
    t.show("друге", Duration::from_secs(2));
    // The first timer would have fired here.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(t.current().as_deref(), Some("друге"));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(t.current(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn countdown_saturates() {
    let c = Countdown::start(Duration::from_secs(10));
    assert_eq!(c.remaining_secs(), 10);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(c.remaining_secs(), 6);
    assert!(!c.expired());
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(c.remaining_secs(), 0);
    assert!(c.expired());
  }
}
