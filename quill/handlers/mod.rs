//! Debounced background handlers.
//!
//! Both handlers follow the cancel-replace discipline: one pending timer
//! per concern, cleared and rescheduled on every new event, so a burst of
//! events collapses into a single action.

use std::{
  sync::Arc,
  time::Duration,
};

use quill_event::AsyncHook;
use tokio::sync::mpsc;

pub mod autosave;
pub mod overlay;

pub use autosave::{
  AutoSaveEvent,
  AutoSaveHandler,
  SaveSink,
};
pub use overlay::{
  OverlayEvent,
  OverlayHideHandler,
};

/// Channel ends the shell keeps for its background handlers.
pub struct Handlers {
  pub auto_save: mpsc::Sender<AutoSaveEvent>,
  pub overlay:   mpsc::Sender<OverlayEvent>,
}

impl Handlers {
  /// Spawn both handlers. The returned receiver delivers overlay-hide
  /// notifications back onto the shell's tick.
  pub fn spawn(
    document_id: String,
    sink: Arc<dyn SaveSink>,
    save_delay: Duration,
    overlay_grace: Duration,
  ) -> (Self, mpsc::UnboundedReceiver<()>) {
    let (hide_tx, hide_rx) = mpsc::unbounded_channel();
    let handlers = Self {
      auto_save: AutoSaveHandler::new(document_id, sink, save_delay).spawn(),
      overlay:   OverlayHideHandler::new(overlay_grace, hide_tx).spawn(),
    };
    (handlers, hide_rx)
  }
}
