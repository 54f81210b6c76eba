//! Async event plumbing shared by the assistant subsystems.
//!
//! Two concerns live here: debounced async hooks (a single pending timer per
//! concern that is cleared and rescheduled on every new event) and generation
//! tokens used to ignore the completion of work that has since been
//! superseded or dismissed.

mod cancel;
mod debounce;

pub use cancel::{
  TaskController,
  TaskHandle,
};
pub use debounce::{
  AsyncHook,
  send_blocking,
  try_send,
};
