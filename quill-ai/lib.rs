//! AI editing backend for the quill authoring assistant.
//!
//! This crate owns everything between "the user typed an instruction" and
//! "an edited text came back": the provider registry with its adapter
//! families, the HTTP transport boundary, and the per-popover edit session
//! state machine.
//!
//! ## Architecture
//!
//! - `provider.rs` - provider configurations, registry, change broadcast
//! - `adapter.rs`  - wire codecs for the supported backend families
//! - `transport.rs` - the one outbound POST per submission
//! - `session.rs`  - edit-session lifecycle and stale-completion filtering
//!
//! The embedding shell drains [`SessionEvent`]s from the channel returned by
//! [`EditPipeline::new`] on its tick; nothing in this crate touches the
//! document directly.

mod adapter;
mod error;
mod provider;
mod session;
mod transport;

pub use adapter::{
  Adapter,
  AdapterFamily,
  WireRequest,
  adapter_for,
};
pub use error::{
  RequestError,
  ValidationError,
};
pub use provider::{
  ProviderConfig,
  ProviderEvent,
  ProviderRegistry,
  RegistryError,
};
pub use session::{
  EditPipeline,
  EditSession,
  SessionEvent,
  SessionId,
  SessionState,
};
pub use transport::{
  HttpTransport,
  Transport,
};

/// One edit request as assembled from the popover. Created fresh per
/// submission and never mutated once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
  /// What the user asked for. Non-empty after trimming.
  pub instruction:   String,
  /// The selection snapshot captured when the session opened, if any.
  pub selected_text: Option<String>,
  /// Surrounding document text, if the shell chose to attach it.
  pub context:       Option<String>,
}

/// Canonical result shape every adapter family must produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
  pub edited_text: String,
  pub explanation: Option<String>,
}

impl EditResult {
  /// An empty `edited_text` means the backend produced no usable output;
  /// the session layer shows "no output" instead of failing.
  pub fn is_empty(&self) -> bool {
    self.edited_text.is_empty()
  }
}

/// Canned instructions offered by the popover to prefill the instruction
/// field. Selecting one never auto-submits.
pub const QUICK_INSTRUCTIONS: &[&str] = &[
  "Fix grammar",
  "Make it concise",
  "Translate to English",
  "Expand",
  "Summarize",
];
