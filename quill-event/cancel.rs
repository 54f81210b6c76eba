//! Generation tokens for invalidating in-flight work.
//!
//! A [`TaskController`] hands out [`TaskHandle`]s stamped with the current
//! generation. Restarting or canceling the controller bumps the generation,
//! which turns every previously issued handle stale. Completion paths check
//! their handle before acting, so a response that arrives after its session
//! was dismissed is simply dropped.

use std::sync::{
  Arc,
  atomic::{
    AtomicU64,
    Ordering,
  },
};

/// Owner side of a cancellation scope.
#[derive(Debug, Default)]
pub struct TaskController {
  generation: Arc<AtomicU64>,
}

impl TaskController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Invalidate all outstanding handles and return a fresh one for the next
  /// unit of work.
  pub fn restart(&self) -> TaskHandle {
    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
    TaskHandle {
      generation,
      current: Arc::clone(&self.generation),
    }
  }

  /// Invalidate all outstanding handles without issuing a new one.
  pub fn cancel(&self) {
    self.generation.fetch_add(1, Ordering::Relaxed);
  }

  /// Whether any handle issued by [`restart`](Self::restart) is still live.
  pub fn is_running(&self, handle: &TaskHandle) -> bool {
    !handle.is_canceled()
  }
}

/// Worker side token. Cheap to clone and send into spawned tasks.
#[derive(Debug, Clone)]
pub struct TaskHandle {
  generation: u64,
  current:    Arc<AtomicU64>,
}

impl TaskHandle {
  /// True once the controller restarted or canceled after this handle was
  /// issued.
  pub fn is_canceled(&self) -> bool {
    self.current.load(Ordering::Relaxed) != self.generation
  }
}

#[cfg(test)]
mod tests {
  use super::TaskController;

  #[test]
  fn fresh_handle_is_live() {
    let controller = TaskController::new();
    let handle = controller.restart();
    assert!(!handle.is_canceled());
    assert!(controller.is_running(&handle));
  }

  #[test]
  fn restart_invalidates_previous_handles() {
    let controller = TaskController::new();
    let first = controller.restart();
    let second = controller.restart();
    assert!(first.is_canceled());
    assert!(!second.is_canceled());
  }

  #[test]
  fn cancel_invalidates_without_new_handle() {
    let controller = TaskController::new();
    let handle = controller.restart();
    controller.cancel();
    assert!(handle.is_canceled());
  }

  #[test]
  fn cloned_handles_share_fate() {
    let controller = TaskController::new();
    let handle = controller.restart();
    let clone = handle.clone();
    controller.cancel();
    assert!(handle.is_canceled());
    assert!(clone.is_canceled());
  }
}
