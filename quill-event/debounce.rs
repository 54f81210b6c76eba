//! Utilities for declaring an async (usually debounced) hook.

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Maximum time to block when sending to a full channel. Dropping an event is
/// preferable to stalling the UI loop.
const SEND_TIMEOUT_MS: u64 = 2;

/// A debounced async event handler running as a background tokio task.
///
/// Synchronous code sends events through the channel returned by [`spawn`];
/// the hook decides per event whether to act immediately or to (re)arm a
/// single debounce deadline. There is never more than one pending deadline
/// per hook: a new event either keeps the current one or replaces it, so a
/// burst of events collapses into one [`finish_debounce`] call.
///
/// [`spawn`]: AsyncHook::spawn
/// [`finish_debounce`]: AsyncHook::finish_debounce
pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;

  /// Called for every received event. Returning `None` means no pending
  /// deadline; returning `Some(instant)` arms (or re-arms) the debounce
  /// timer. The current deadline, if any, is passed in so it can be kept.
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called once the armed deadline elapses with no further rescheduling.
  fn finish_debounce(&mut self);

  fn spawn(self) -> mpsc::Sender<Self::Event> {
    // Sized to absorb rapid-fire selection/edit events without backpressure.
    let (tx, rx) = mpsc::channel(128);
    // Only spawn the worker inside a runtime so unit tests that never touch
    // this hook don't need one.
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    }
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(deadline_) => {
        let res = tokio::time::timeout_at(deadline_, rx.recv()).await;
        match res {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Send an event to a hook channel, blocking only briefly if it is full.
///
/// Meant for synchronous callers (selection callbacks, command apply paths)
/// that must never stall behind the async side. The fast path is a
/// non-blocking send; on a full channel we wait at most `SEND_TIMEOUT_MS`
/// and then drop the event.
pub fn send_blocking<T>(tx: &Sender<T>, data: T) {
  match tx.try_send(data) {
    Ok(()) => {},
    Err(TrySendError::Full(data)) => {
      let _ = block_on(tx.send_timeout(data, Duration::from_millis(SEND_TIMEOUT_MS)));
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("attempted to send to closed hook channel");
    },
  }
}

/// Try to send an event without blocking at all.
/// Returns true if the event was sent, false if the channel was full or closed.
pub fn try_send<T>(tx: &Sender<T>, data: T) -> bool {
  tx.try_send(data).is_ok()
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  };

  use tokio::time::{
    Duration,
    Instant,
  };

  use super::AsyncHook;

  struct CountingHook {
    fired: Arc<AtomicUsize>,
    delay: Duration,
  }

  impl AsyncHook for CountingHook {
    type Event = ();

    fn handle_event(&mut self, _event: (), _timeout: Option<Instant>) -> Option<Instant> {
      Some(Instant::now() + self.delay)
    }

    fn finish_debounce(&mut self) {
      self.fired.fetch_add(1, Ordering::SeqCst);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn burst_of_events_fires_once() {
    let fired = Arc::new(AtomicUsize::new(0));
    let tx = CountingHook {
      fired: fired.clone(),
      delay: Duration::from_millis(50),
    }
    .spawn();

    for _ in 0..10 {
      tx.send(()).await.unwrap();
      tokio::task::yield_now().await;
      tokio::time::advance(Duration::from_millis(10)).await;
    }
    // Each event re-armed the deadline, so nothing fired during the burst.
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    tokio::time::advance(Duration::from_millis(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn separate_bursts_fire_separately() {
    let fired = Arc::new(AtomicUsize::new(0));
    let tx = CountingHook {
      fired: fired.clone(),
      delay: Duration::from_millis(20),
    }
    .spawn();

    tx.send(()).await.unwrap();
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    tx.send(()).await.unwrap();
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(fired.load(Ordering::SeqCst), 2);
  }
}
