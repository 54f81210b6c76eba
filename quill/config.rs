//! Assistant configuration.
//!
//! Loaded from a TOML file when one is given, otherwise the defaults mirror
//! a fresh install: both stock providers present but disabled until a key
//! is pasted. Persisting changes back to disk belongs to the settings
//! subsystem, not to this crate.

use std::{
  path::Path,
  time::Duration,
};

use anyhow::Context;
use quill_ai::ProviderConfig;
use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AssistantConfig {
  /// Character that opens the command palette at the caret.
  pub trigger_char:       char,
  /// Grace window before a focus loss hides the toolbar.
  pub overlay_grace_ms:   u64,
  pub auto_save:          bool,
  /// Trailing-edge debounce for autosave.
  pub auto_save_delay_ms: u64,
  /// Budget of surrounding chars attached to edit requests as context.
  /// Zero disables context gathering.
  pub context_chars:      usize,
  pub default_provider:   Option<String>,
  pub providers:          Vec<ProviderConfig>,
}

impl Default for AssistantConfig {
  fn default() -> Self {
    Self {
      trigger_char:       '/',
      overlay_grace_ms:   200,
      auto_save:          true,
      auto_save_delay_ms: 1000,
      context_chars:      400,
      default_provider:   None,
      providers:          vec![
        ProviderConfig::openai_preset(),
        ProviderConfig::claude_preset(),
      ],
    }
  }
}

impl AssistantConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
  }

  /// Load from `path` when given, falling back to defaults (and logging the
  /// failure) when the file is missing or malformed.
  pub fn load_or_default(path: Option<&Path>) -> Self {
    match path {
      Some(path) => match Self::load(path) {
        Ok(config) => config,
        Err(err) => {
          log::warn!("{err:#}; using default configuration");
          Self::default()
        },
      },
      None => Self::default(),
    }
  }

  pub fn overlay_grace(&self) -> Duration {
    Duration::from_millis(self.overlay_grace_ms)
  }

  pub fn auto_save_delay(&self) -> Duration {
    Duration::from_millis(self.auto_save_delay_ms)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_ship_both_presets_disabled() {
    let config = AssistantConfig::default();
    assert_eq!(config.trigger_char, '/');
    assert_eq!(config.providers.len(), 2);
    assert!(config.providers.iter().all(|p| !p.enabled));
    assert_eq!(config.default_provider, None);
  }

  #[test]
  fn partial_config_files_fill_in_defaults() {
    let config: AssistantConfig = toml::from_str(
      r#"
        overlay-grace-ms = 300

        [[providers]]
        id = "local"
        name = "Local"
        api-key = "unused"
        base-url = "http://localhost:8080/v1"
        model = "llama"
        enabled = true
        family = "chat-completion"
      "#,
    )
    .unwrap();
    assert_eq!(config.overlay_grace_ms, 300);
    assert_eq!(config.auto_save_delay_ms, 1000);
    assert_eq!(config.providers.len(), 1);
    assert!(config.providers[0].enabled);
  }

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let config = AssistantConfig::load_or_default(Some(Path::new("/nonexistent/quill.toml")));
    assert_eq!(config, AssistantConfig::default());
  }

  #[test]
  fn config_files_round_trip() {
    let mut config = AssistantConfig::default();
    config.auto_save = false;
    config.default_provider = Some("claude".into());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.toml");
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
    assert_eq!(AssistantConfig::load(&path).unwrap(), config);
  }
}
