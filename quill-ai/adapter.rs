//! Wire codecs for the supported backend families.
//!
//! An adapter serializes an [`EditRequest`] into one POST for its family and
//! extracts the edited text out of that family's response envelope. Most
//! hosted backends are protocol-compatible supersets of the chat-completion
//! shape, so unmatched providers fall back to that family instead of
//! erroring.

use serde::{
  Deserialize,
  Serialize,
};
use serde_json::{
  Value,
  json,
};

use crate::{
  EditRequest,
  EditResult,
  error::RequestError,
  provider::ProviderConfig,
  transport::Transport,
};

/// Generation parameters sized for a few paragraphs of deterministic-ish
/// editing.
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2000;

const SYSTEM_PROMPT: &str = "You are a professional text editing assistant. Edit the text \
                             according to the user's instruction and return only the edited \
                             result, without any explanation.";

/// Version header required by the message-style protocol.
const MESSAGE_API_VERSION: &str = "2023-06-01";

const PLACEHOLDER_EXPLANATION: &str = "Edited by the configured provider.";

/// A named request/response protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterFamily {
  /// OpenAI-style `/chat/completions` with system + user turns and bearer
  /// auth.
  ChatCompletion,
  /// Anthropic-style `/v1/messages` with a single combined user turn and
  /// key-header auth.
  Message,
}

impl AdapterFamily {
  /// Dispatch rule: the declared family wins; legacy configs without one are
  /// recognized by id or a base-url signature, and everything else is
  /// assumed to speak the chat protocol.
  pub fn for_provider(config: &ProviderConfig) -> Self {
    if let Some(family) = config.family {
      return family;
    }
    if matches!(config.id.as_str(), "claude" | "anthropic")
      || config.base_url.contains("anthropic")
    {
      AdapterFamily::Message
    } else {
      AdapterFamily::ChatCompletion
    }
  }
}

/// One fully assembled outbound POST.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
  pub url:     String,
  pub headers: Vec<(&'static str, String)>,
  pub body:    Value,
}

/// Codec for one adapter family.
#[derive(Debug, Clone, Copy)]
pub struct Adapter {
  family: AdapterFamily,
}

/// Look up the adapter for a provider.
pub fn adapter_for(config: &ProviderConfig) -> Adapter {
  Adapter {
    family: AdapterFamily::for_provider(config),
  }
}

impl Adapter {
  pub fn family(&self) -> AdapterFamily {
    self.family
  }

  /// Serialize the request into this family's wire shape.
  pub fn build_request(&self, config: &ProviderConfig, request: &EditRequest) -> WireRequest {
    let base = config.base_url.trim_end_matches('/');
    match self.family {
      AdapterFamily::ChatCompletion => {
        let mut user = format!("Instruction: {}", request.instruction);
        if let Some(selected) = &request.selected_text {
          user.push_str("\n\nText to edit:\n");
          user.push_str(selected);
        }
        if let Some(context) = &request.context {
          user.push_str("\n\nContext:\n");
          user.push_str(context);
        }
        WireRequest {
          url:     format!("{base}/chat/completions"),
          headers: vec![("authorization", format!("Bearer {}", config.api_key))],
          body:    json!({
            "model": config.model,
            "messages": [
              { "role": "system", "content": SYSTEM_PROMPT },
              { "role": "user", "content": user },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
          }),
        }
      },
      AdapterFamily::Message => {
        let mut prompt = format!("Instruction: {}", request.instruction);
        if let Some(context) = &request.context {
          prompt.push_str("\n\nContext:\n");
          prompt.push_str(context);
        }
        if let Some(selected) = &request.selected_text {
          prompt.push_str("\n\nText to edit:\n");
          prompt.push_str(selected);
        }
        prompt.push_str("\n\nReturn only the edited text.");
        WireRequest {
          url:     format!("{base}/v1/messages"),
          headers: vec![
            ("x-api-key", config.api_key.clone()),
            ("anthropic-version", MESSAGE_API_VERSION.to_string()),
          ],
          body:    json!({
            "model": config.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
              { "role": "user", "content": prompt },
            ],
          }),
        }
      },
    }
  }

  /// Extract the textual payload from this family's response envelope.
  /// A missing field degrades to an empty result, never an error.
  pub fn parse_response(&self, body: &Value) -> EditResult {
    let text = match self.family {
      AdapterFamily::ChatCompletion => body["choices"][0]["message"]["content"].as_str(),
      AdapterFamily::Message => body["content"][0]["text"].as_str(),
    };
    let Some(text) = text else {
      log::warn!("backend response is missing the text payload");
      return EditResult::default();
    };
    EditResult {
      edited_text: text.to_string(),
      explanation: Some(PLACEHOLDER_EXPLANATION.to_string()),
    }
  }

  /// Run one submission end to end through the given transport.
  pub async fn send(
    &self,
    transport: &dyn Transport,
    config: &ProviderConfig,
    request: &EditRequest,
  ) -> Result<EditResult, RequestError> {
    let wire = self.build_request(config, request);
    let body = transport.post_json(&wire).await?;
    Ok(self.parse_response(&body))
  }
}
