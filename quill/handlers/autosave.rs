//! Trailing-edge debounced autosave.
//!
//! Every document mutation sends the fresh content here; the save only goes
//! out to the storage collaborator once the edits pause. Only the most
//! recent pending content survives a burst.

use std::{
  sync::Arc,
  time::Duration,
};

use quill_event::AsyncHook;
use tokio::time::Instant;

/// The persistence boundary. Everything behind it (format, location) is an
/// excluded subsystem.
pub trait SaveSink: Send + Sync {
  fn save(&self, document_id: &str, content: &str);
}

#[derive(Debug)]
pub enum AutoSaveEvent {
  DocumentChanged { content: String },
}

pub struct AutoSaveHandler {
  document_id: String,
  sink:        Arc<dyn SaveSink>,
  delay:       Duration,
  pending:     Option<String>,
}

impl AutoSaveHandler {
  pub fn new(document_id: String, sink: Arc<dyn SaveSink>, delay: Duration) -> Self {
    Self {
      document_id,
      sink,
      delay,
      pending: None,
    }
  }
}

impl AsyncHook for AutoSaveHandler {
  type Event = AutoSaveEvent;

  fn handle_event(&mut self, event: Self::Event, _timeout: Option<Instant>) -> Option<Instant> {
    let AutoSaveEvent::DocumentChanged { content } = event;
    self.pending = Some(content);
    Some(Instant::now() + self.delay)
  }

  fn finish_debounce(&mut self) {
    if let Some(content) = self.pending.take() {
      log::debug!("autosaving document {}", self.document_id);
      self.sink.save(&self.document_id, &content);
    }
  }
}
