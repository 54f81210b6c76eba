//! The assistant shell: one editing session's worth of wiring.
//!
//! The shell owns the document surface and every state machine around it,
//! and is driven from the host's UI loop in two ways: input notifications
//! (typed characters, key presses, focus changes) as they happen, and
//! [`tick`](AssistantShell::tick) once per frame after layout. The tick is
//! where deferred work runs: pending selection resolution, anchor
//! recomputation, overlay-hide notifications, and AI completion events.

use std::sync::Arc;

use quill_ai::{
  EditPipeline,
  EditSession,
  ProviderRegistry,
  RegistryError,
  SessionEvent,
  Transport,
  ValidationError,
};
use quill_event::send_blocking;
use tokio::sync::mpsc;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
  anchor::{
    AnchorPoint,
    SelectionGeometry,
    caret_anchor,
  },
  config::AssistantConfig,
  document::{
    DocumentSurface,
    SelectionRange,
  },
  handlers::{
    AutoSaveEvent,
    Handlers,
    OverlayEvent,
    SaveSink,
  },
  selection::SelectionTracker,
  suggestion::{
    Committed,
    SuggestionEngine,
  },
};

/// Fixed menu dimensions used for anchoring the palette.
const MENU_WIDTH: f32 = 240.0;
const MENU_HEIGHT: f32 = 200.0;

/// Where an AI session will write its accepted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionOrigin {
  /// Replace this span (captured when the session opened).
  Selection(SelectionRange),
  /// Insert at the caret.
  Caret,
}

/// Live character/word counts for a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
  pub chars: usize,
  pub words: usize,
}

pub struct AssistantShell<S: DocumentSurface> {
  surface:        S,
  config:         AssistantConfig,
  registry:       ProviderRegistry,
  tracker:        SelectionTracker,
  suggestion:     SuggestionEngine,
  pipeline:       EditPipeline,
  session_events: mpsc::UnboundedReceiver<SessionEvent>,
  session:        Option<EditSession>,
  session_origin: Option<SessionOrigin>,
  handlers:       Handlers,
  hide_rx:        mpsc::UnboundedReceiver<()>,
  menu_anchor:    Option<AnchorPoint>,
}

impl<S: DocumentSurface> AssistantShell<S> {
  /// Wire up a shell for one document. Must be called inside a tokio
  /// runtime so the debounced handlers can spawn.
  pub fn new(
    surface: S,
    document_id: impl Into<String>,
    config: AssistantConfig,
    sink: Arc<dyn SaveSink>,
    transport: Arc<dyn Transport>,
  ) -> Result<Self, RegistryError> {
    let registry =
      ProviderRegistry::from_parts(config.providers.clone(), config.default_provider.clone())?;
    let (pipeline, session_events) = EditPipeline::new(transport);
    let (handlers, hide_rx) = Handlers::spawn(
      document_id.into(),
      sink,
      config.auto_save_delay(),
      config.overlay_grace(),
    );
    let suggestion = SuggestionEngine::new(config.trigger_char);
    Ok(Self {
      surface,
      config,
      registry,
      tracker: SelectionTracker::new(),
      suggestion,
      pipeline,
      session_events,
      session: None,
      session_origin: None,
      handlers,
      hide_rx,
      menu_anchor: None,
    })
  }

  // ---- input ----

  /// A character was typed at the caret.
  pub fn type_char(&mut self, c: char) {
    let caret = self.surface.selection().head;
    self.suggestion.observe_char(c, caret);
    self.surface.insert_at_caret(&c.to_string());
    self.document_changed();
  }

  pub fn backspace(&mut self) {
    let caret = self.surface.selection().head;
    if caret == 0 {
      return;
    }
    self.surface.delete(SelectionRange::new(caret - 1, caret));
    self.suggestion.observe_backspace();
    self.document_changed();
  }

  pub fn key_down(&mut self) {
    self.suggestion.move_down();
  }

  pub fn key_up(&mut self) {
    self.suggestion.move_up();
  }

  /// Enter commits the palette when it is open, otherwise inserts a
  /// newline.
  pub fn enter(&mut self) -> Option<Committed> {
    if !self.suggestion.is_open() {
      self.type_char('\n');
      return None;
    }
    let outcome = self.suggestion.commit(&mut self.surface)?;
    self.document_changed();
    if outcome == Committed::OpenAiEdit {
      // Palette-initiated sessions open at the caret, no selection.
      self.session = Some(EditSession::open(None));
      self.session_origin = Some(SessionOrigin::Caret);
    }
    Some(outcome)
  }

  /// Escape closes the palette first, then an open AI session.
  pub fn escape(&mut self) {
    if self.suggestion.is_open() {
      self.suggestion.escape();
    } else if self.session.is_some() {
      self.close_session();
    }
  }

  /// The editing surface lost focus (e.g. a toolbar button grabbed it).
  pub fn focus_lost(&mut self) {
    send_blocking(&self.handlers.overlay, OverlayEvent::FocusLost);
  }

  // ---- AI session ----

  /// Open the AI popover from the toolbar, capturing the current selection.
  pub fn open_ai_edit(&mut self) {
    let range = self.surface.selection();
    if range.is_collapsed() {
      self.session = Some(EditSession::open(None));
      self.session_origin = Some(SessionOrigin::Caret);
    } else {
      let text = self.surface.text_in(range);
      self.session = Some(EditSession::open(Some(text)));
      self.session_origin = Some(SessionOrigin::Selection(range));
    }
  }

  pub fn session(&self) -> Option<&EditSession> {
    self.session.as_ref()
  }

  pub fn set_instruction(&mut self, instruction: &str) {
    if let Some(session) = self.session.as_mut() {
      session.instruction = instruction.to_string();
    }
  }

  pub fn quick_instruction(&mut self, index: usize) -> bool {
    self
      .session
      .as_mut()
      .is_some_and(|session| session.use_quick_instruction(index))
  }

  /// Submit the open session's instruction. `Ok(false)` means there was no
  /// session or a call is already outstanding.
  pub fn submit(&mut self) -> Result<bool, ValidationError> {
    let context = self.gather_context();
    let Some(session) = self.session.as_mut() else {
      return Ok(false);
    };
    self.pipeline.submit(session, &self.registry, context)
  }

  /// Apply the session's result back to the document and destroy the
  /// session. Returns false while there is no usable result.
  pub fn apply_result(&mut self) -> bool {
    let Some(session) = self.session.as_mut() else {
      return false;
    };
    if session.result().is_none_or(|result| result.is_empty()) {
      return false;
    }
    let Some(result) = session.take_result() else {
      return false;
    };

    match self.session_origin.take() {
      Some(SessionOrigin::Selection(range)) => {
        self.surface.replace(range, &result.edited_text);
      },
      Some(SessionOrigin::Caret) | None => {
        self.surface.insert_at_caret(&result.edited_text);
      },
    }
    self.session = None;
    self.document_changed();
    true
  }

  /// Dismiss the session without touching the document. Any in-flight
  /// request is invalidated; its eventual resolution is ignored.
  pub fn close_session(&mut self) {
    self.session = None;
    self.session_origin = None;
  }

  // ---- tick ----

  /// Run the deferred work for this frame. `geometry` must reflect the
  /// host's finished layout; anchors computed from it are used until the
  /// next tick.
  pub fn tick(&mut self, geometry: &dyn SelectionGeometry) {
    // Selection notifications coalesce into the tracker's pending slot;
    // only the latest survives.
    for range in self.surface.take_selection_changes() {
      self.tracker.selection_changed(range);
    }
    if self.tracker.resolve(&self.surface, geometry) && self.tracker.is_overlay_visible() {
      send_blocking(&self.handlers.overlay, OverlayEvent::SelectionActive);
    }

    while self.hide_rx.try_recv().is_ok() {
      self.tracker.hide_overlay();
    }

    while let Ok(event) = self.session_events.try_recv() {
      match self.session.as_mut() {
        Some(session) => {
          session.handle_event(event);
        },
        None => {
          log::debug!(
            "dropping completion for dismissed session {}",
            event.session()
          );
        },
      }
    }

    self.menu_anchor = self
      .suggestion
      .caret()
      .and_then(|caret| geometry.caret_rect(caret))
      .map(|rect| caret_anchor(rect, MENU_WIDTH, MENU_HEIGHT, geometry.viewport()));
  }

  // ---- projections ----

  pub fn surface(&self) -> &S {
    &self.surface
  }

  pub fn surface_mut(&mut self) -> &mut S {
    &mut self.surface
  }

  pub fn tracker(&self) -> &SelectionTracker {
    &self.tracker
  }

  pub fn suggestion(&self) -> &SuggestionEngine {
    &self.suggestion
  }

  /// Anchor for the palette menu, recomputed on every tick while open.
  pub fn menu_anchor(&self) -> Option<AnchorPoint> {
    self.menu_anchor
  }

  pub fn registry(&self) -> &ProviderRegistry {
    &self.registry
  }

  pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
    &mut self.registry
  }

  pub fn status(&self) -> StatusInfo {
    let text = self.surface.text();
    StatusInfo {
      chars: text.chars().count(),
      words: text.unicode_words().count(),
    }
  }

  // ---- internals ----

  fn document_changed(&mut self) {
    if !self.config.auto_save {
      return;
    }
    send_blocking(
      &self.handlers.auto_save,
      AutoSaveEvent::DocumentChanged {
        content: self.surface.text(),
      },
    );
  }

  /// A window of surrounding text attached to edit requests, sized by
  /// configuration. Skipped when it would add nothing beyond the selection
  /// itself.
  fn gather_context(&self) -> Option<String> {
    let budget = self.config.context_chars;
    if budget == 0 {
      return None;
    }
    let range = match self.session_origin {
      Some(SessionOrigin::Selection(range)) => range,
      Some(SessionOrigin::Caret) => SelectionRange::collapsed(self.surface.selection().head),
      None => return None,
    };
    let start = range.from().saturating_sub(budget / 2);
    let end = (range.to() + budget / 2).min(self.surface.len_chars());
    if start == range.from() && end == range.to() {
      return None;
    }
    let window = self.surface.text_in(SelectionRange::new(start, end));
    if window.is_empty() {
      None
    } else {
      Some(window)
    }
  }
}
