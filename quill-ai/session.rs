//! Edit-session lifecycle.
//!
//! A session spans one popover: open, zero or more submissions, then apply,
//! cancel, or dismiss. At most one network call is outstanding per session;
//! a completion is only honored if its session id still matches the live
//! session and the session's cancellation token was not invalidated in the
//! meantime, so dismissing the popover mid-flight can never mutate the
//! document afterwards.

use std::sync::{
  Arc,
  atomic::{
    AtomicU64,
    Ordering,
  },
};

use quill_event::TaskController;
use tokio::sync::mpsc;

use crate::{
  EditRequest,
  EditResult,
  adapter::adapter_for,
  error::{
    RequestError,
    ValidationError,
  },
  provider::ProviderRegistry,
  transport::Transport,
};

pub type SessionId = u64;

static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_session_id() -> SessionId {
  SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Where one session currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
  #[default]
  Idle,
  Submitting,
  /// The backend answered. An empty `edited_text` reads as "no output";
  /// the user can resubmit or dismiss.
  Result(EditResult),
  /// The request failed. Dismissible, resubmittable, never auto-retried.
  Failed(String),
}

/// Completion notifications delivered back onto the shell's event loop.
#[derive(Debug)]
pub enum SessionEvent {
  Completed {
    session: SessionId,
    result:  EditResult,
  },
  Failed {
    session: SessionId,
    error:   RequestError,
  },
}

impl SessionEvent {
  pub fn session(&self) -> SessionId {
    match self {
      SessionEvent::Completed { session, .. } | SessionEvent::Failed { session, .. } => *session,
    }
  }
}

/// One AI-edit interaction, from open to apply/cancel/close.
#[derive(Debug)]
pub struct EditSession {
  id:            SessionId,
  selected_text: Option<String>,
  /// Instruction draft, edited by the popover until submission.
  pub instruction: String,
  state:         SessionState,
  controller:    TaskController,
  task:          Option<tokio::task::JoinHandle<()>>,
}

impl EditSession {
  /// Open a session, capturing the selection snapshot if the surface had
  /// one. `None` means the session will insert at the caret on apply.
  pub fn open(selected_text: Option<String>) -> Self {
    Self {
      id: next_session_id(),
      selected_text,
      instruction: String::new(),
      state: SessionState::Idle,
      controller: TaskController::new(),
      task: None,
    }
  }

  pub fn id(&self) -> SessionId {
    self.id
  }

  pub fn selected_text(&self) -> Option<&str> {
    self.selected_text.as_deref()
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn is_submitting(&self) -> bool {
    matches!(self.state, SessionState::Submitting)
  }

  pub fn result(&self) -> Option<&EditResult> {
    match &self.state {
      SessionState::Result(result) => Some(result),
      _ => None,
    }
  }

  /// Prefill the instruction field from [`crate::QUICK_INSTRUCTIONS`].
  /// Never submits.
  pub fn use_quick_instruction(&mut self, index: usize) -> bool {
    match crate::QUICK_INSTRUCTIONS.get(index) {
      Some(instruction) => {
        self.instruction = (*instruction).to_string();
        true
      },
      None => false,
    }
  }

  /// Route a completion event into this session. Returns false for events
  /// belonging to another (stale) session or arriving in the wrong state.
  pub fn handle_event(&mut self, event: SessionEvent) -> bool {
    if event.session() != self.id || !self.is_submitting() {
      log::debug!("dropping stale session event for session {}", event.session());
      return false;
    }
    self.task = None;
    self.state = match event {
      SessionEvent::Completed { result, .. } => SessionState::Result(result),
      SessionEvent::Failed { error, .. } => SessionState::Failed(error.to_string()),
    };
    true
  }

  /// Hand the result out for applying. The caller destroys the session
  /// afterwards; nothing is retained for reopening.
  pub fn take_result(&mut self) -> Option<EditResult> {
    match std::mem::take(&mut self.state) {
      SessionState::Result(result) => Some(result),
      other => {
        self.state = other;
        None
      },
    }
  }
}

impl Drop for EditSession {
  fn drop(&mut self) {
    // Invalidate the token first: correctness rests on the check, the abort
    // is best effort.
    self.controller.cancel();
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

/// Submission side of the pipeline: resolves the active provider, invokes
/// the adapter off the UI loop, and reports back on the event channel.
pub struct EditPipeline {
  transport: Arc<dyn Transport>,
  event_tx:  mpsc::UnboundedSender<SessionEvent>,
}

impl EditPipeline {
  pub fn new(transport: Arc<dyn Transport>) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (
      Self {
        transport,
        event_tx,
      },
      event_rx,
    )
  }

  /// Submit the session's current instruction.
  ///
  /// Validation failures are reported without any network traffic. A submit
  /// while a call is already outstanding is a no-op and returns
  /// `Ok(false)`. A successful submit discards any previous result.
  pub fn submit(
    &self,
    session: &mut EditSession,
    registry: &ProviderRegistry,
    context: Option<String>,
  ) -> Result<bool, ValidationError> {
    if session.is_submitting() {
      return Ok(false);
    }

    let instruction = session.instruction.trim();
    if instruction.is_empty() {
      return Err(ValidationError::EmptyInstruction);
    }
    let provider = registry
      .resolve_active()
      .ok_or(ValidationError::NoActiveProvider)?
      .clone();

    let request = EditRequest {
      instruction:   instruction.to_string(),
      selected_text: session.selected_text.clone(),
      context,
    };
    let adapter = adapter_for(&provider);
    let handle = session.controller.restart();
    let transport = Arc::clone(&self.transport);
    let events = self.event_tx.clone();
    let id = session.id;

    session.state = SessionState::Submitting;
    session.task = Some(tokio::spawn(async move {
      let outcome = adapter.send(transport.as_ref(), &provider, &request).await;
      if handle.is_canceled() {
        log::debug!("session {id} was closed before its request resolved");
        return;
      }
      let event = match outcome {
        Ok(result) => SessionEvent::Completed {
          session: id,
          result,
        },
        Err(error) => SessionEvent::Failed { session: id, error },
      };
      let _ = events.send(event);
    }));
    Ok(true)
  }
}
