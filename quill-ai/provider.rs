//! Provider configurations and the registry that resolves the active one.
//!
//! The registry is a plain ordered list built at startup from the config
//! file and mutated only through the CRUD methods below. Every mutation is
//! published on an explicit broadcast channel so other consumers (a second
//! window, a settings panel) can subscribe instead of relying on ambient
//! globals.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::adapter::AdapterFamily;

/// One configured backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProviderConfig {
  pub id:       String,
  pub name:     String,
  pub api_key:  String,
  pub base_url: String,
  pub model:    String,
  pub enabled:  bool,
  /// Declared wire protocol. Legacy configs may omit this; adapter dispatch
  /// then falls back to id/base-url sniffing.
  pub family:   Option<AdapterFamily>,
}

impl ProviderConfig {
  /// Eligible to be resolved as the active provider.
  pub fn is_eligible(&self) -> bool {
    self.enabled && !self.api_key.trim().is_empty()
  }

  /// The stock OpenAI entry shipped in a fresh config, disabled until the
  /// user pastes a key.
  pub fn openai_preset() -> Self {
    Self {
      id:       "openai".into(),
      name:     "OpenAI".into(),
      api_key:  String::new(),
      base_url: "https://api.openai.com/v1".into(),
      model:    "gpt-3.5-turbo".into(),
      enabled:  false,
      family:   Some(AdapterFamily::ChatCompletion),
    }
  }

  /// The stock Claude entry shipped in a fresh config.
  pub fn claude_preset() -> Self {
    Self {
      id:       "claude".into(),
      name:     "Claude".into(),
      api_key:  String::new(),
      base_url: "https://api.anthropic.com".into(),
      model:    "claude-3-sonnet-20240229".into(),
      enabled:  false,
      family:   Some(AdapterFamily::Message),
    }
  }
}

/// Change notifications published by [`ProviderRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
  Added(String),
  Updated(String),
  Removed(String),
  DefaultChanged(Option<String>),
}

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("unknown provider: {0}")]
  UnknownProvider(String),
  #[error("provider already registered: {0}")]
  DuplicateProvider(String),
}

/// Ordered provider store. Registration order matters: when no default is
/// eligible, the first eligible entry wins.
#[derive(Debug)]
pub struct ProviderRegistry {
  providers: Vec<ProviderConfig>,
  default:   Option<String>,
  events:    broadcast::Sender<ProviderEvent>,
}

impl Default for ProviderRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl ProviderRegistry {
  pub fn new() -> Self {
    let (events, _) = broadcast::channel(16);
    Self {
      providers: Vec::new(),
      default: None,
      events,
    }
  }

  /// A registry pre-populated with the stock presets, as a fresh install
  /// would see it.
  pub fn with_presets() -> Self {
    let mut registry = Self::new();
    // Presets have fixed distinct ids.
    registry
      .add(ProviderConfig::openai_preset())
      .expect("preset ids are unique");
    registry
      .add(ProviderConfig::claude_preset())
      .expect("preset ids are unique");
    registry
  }

  /// Build from configuration, preserving file order.
  pub fn from_parts(
    providers: Vec<ProviderConfig>,
    default: Option<String>,
  ) -> Result<Self, RegistryError> {
    let mut registry = Self::new();
    for provider in providers {
      registry.add(provider)?;
    }
    if let Some(id) = default {
      registry.set_default(Some(id))?;
    }
    Ok(registry)
  }

  /// Subscribe to change notifications. Each subscriber gets every event
  /// published after the call.
  pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
    self.events.subscribe()
  }

  pub fn providers(&self) -> &[ProviderConfig] {
    &self.providers
  }

  pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
    self.providers.iter().find(|p| p.id == id)
  }

  pub fn default_provider(&self) -> Option<&str> {
    self.default.as_deref()
  }

  pub fn add(&mut self, provider: ProviderConfig) -> Result<(), RegistryError> {
    if self.get(&provider.id).is_some() {
      return Err(RegistryError::DuplicateProvider(provider.id));
    }
    let id = provider.id.clone();
    self.providers.push(provider);
    let _ = self.events.send(ProviderEvent::Added(id));
    Ok(())
  }

  /// Mutate a provider in place.
  pub fn update(
    &mut self,
    id: &str,
    mutate: impl FnOnce(&mut ProviderConfig),
  ) -> Result<(), RegistryError> {
    let provider = self
      .providers
      .iter_mut()
      .find(|p| p.id == id)
      .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))?;
    mutate(provider);
    // The id is the registry key; keep it stable across updates.
    provider.id = id.to_string();
    let _ = self.events.send(ProviderEvent::Updated(id.to_string()));
    Ok(())
  }

  /// Remove a provider. Removing the default clears the default.
  pub fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
    let index = self
      .providers
      .iter()
      .position(|p| p.id == id)
      .ok_or_else(|| RegistryError::UnknownProvider(id.to_string()))?;
    self.providers.remove(index);
    let _ = self.events.send(ProviderEvent::Removed(id.to_string()));
    if self.default.as_deref() == Some(id) {
      self.default = None;
      let _ = self.events.send(ProviderEvent::DefaultChanged(None));
    }
    Ok(())
  }

  pub fn set_default(&mut self, id: Option<String>) -> Result<(), RegistryError> {
    if let Some(id) = &id {
      if self.get(id).is_none() {
        return Err(RegistryError::UnknownProvider(id.clone()));
      }
    }
    self.default = id.clone();
    let _ = self.events.send(ProviderEvent::DefaultChanged(id));
    Ok(())
  }

  /// Resolution policy: the default if it is eligible, otherwise the first
  /// eligible provider in registration order, otherwise none.
  pub fn resolve_active(&self) -> Option<&ProviderConfig> {
    if let Some(default) = self.default.as_deref() {
      if let Some(provider) = self.get(default) {
        if provider.is_eligible() {
          return Some(provider);
        }
      }
    }
    self.providers.iter().find(|p| p.is_eligible())
  }
}
