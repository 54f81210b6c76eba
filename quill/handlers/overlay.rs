//! Debounced overlay dismissal.
//!
//! Losing focus schedules a hide after a short grace window so that a
//! toolbar button click, which transiently steals focus, does not close the
//! toolbar it belongs to. A selection becoming active again inside the
//! window cancels the pending hide.

use std::time::Duration;

use quill_event::AsyncHook;
use tokio::{
  sync::mpsc,
  time::Instant,
};

#[derive(Debug)]
pub enum OverlayEvent {
  /// The editing surface lost focus; hide after the grace window.
  FocusLost,
  /// A non-collapsed selection is live again; cancel any pending hide.
  SelectionActive,
}

pub struct OverlayHideHandler {
  grace:   Duration,
  armed:   bool,
  hide_tx: mpsc::UnboundedSender<()>,
}

impl OverlayHideHandler {
  pub fn new(grace: Duration, hide_tx: mpsc::UnboundedSender<()>) -> Self {
    Self {
      grace,
      armed: false,
      hide_tx,
    }
  }
}

impl AsyncHook for OverlayHideHandler {
  type Event = OverlayEvent;

  fn handle_event(&mut self, event: Self::Event, _timeout: Option<Instant>) -> Option<Instant> {
    match event {
      OverlayEvent::FocusLost => {
        self.armed = true;
        Some(Instant::now() + self.grace)
      },
      OverlayEvent::SelectionActive => {
        self.armed = false;
        None
      },
    }
  }

  fn finish_debounce(&mut self) {
    if self.armed {
      self.armed = false;
      let _ = self.hide_tx.send(());
    }
  }
}
