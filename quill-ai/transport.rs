//! The network boundary: one POST per submission.
//!
//! Adapters build [`WireRequest`]s and parse response bodies; the transport
//! only moves JSON across the wire. Tests install their own implementation
//! to record or script traffic without a server.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
  adapter::WireRequest,
  error::RequestError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Transport: Send + Sync {
  /// POST the request body as JSON and return the decoded response body.
  async fn post_json(&self, request: &WireRequest) -> Result<Value, RequestError>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn post_json(&self, request: &WireRequest) -> Result<Value, RequestError> {
    let mut builder = self
      .client
      .post(&request.url)
      .timeout(REQUEST_TIMEOUT)
      .json(&request.body);
    for (name, value) in &request.headers {
      builder = builder.header(*name, value);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| RequestError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(RequestError::Status(status.to_string()));
    }

    // A non-JSON success body is treated as "no usable output" downstream,
    // not as a failure.
    Ok(response.json().await.unwrap_or_else(|e| {
      log::warn!("response body is not valid JSON: {e}");
      Value::Null
    }))
  }
}
