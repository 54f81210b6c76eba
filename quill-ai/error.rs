use thiserror::Error;

/// Rejections raised before any network traffic. Recoverable by changing
/// the input or the provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("edit instruction is empty")]
  EmptyInstruction,
  #[error("no provider is enabled with an API key")]
  NoActiveProvider,
}

/// Failures of an issued request. Never retried automatically; the session
/// stays resubmittable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
  /// Connectivity or protocol failure below HTTP semantics.
  #[error("network error: {0}")]
  Network(String),
  /// The backend answered with a non-success status.
  #[error("request failed: {0}")]
  Status(String),
}
