// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fs, path::Path};

use miette::{IntoDiagnostic, WrapErr};
use serde::{Deserialize, Serialize};

use crate::{HISTORY_SIZE_MAX, try_get_config_file_path};

pub const DEFAULT_PROMPT: &str = "> ";
pub const DEFAULT_CONTINUATION_PROMPT: &str = "... ";

/// Settings for an [`crate::AsyncRepl`]. Every field is optional in the JSON file, a
/// missing one takes its default.
///
/// ```json
/// { "history_size": 500, "persist_history": true, "prompt": "calc> " }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Initial mode of the [`crate::InputGate`].
    pub block_on_newline_by_default: bool,
    /// Whether a pending evaluation is raced against `Ctrl+C`.
    pub interrupt_enabled: bool,
    /// [None] means detect it.
    pub terminal_is_interactive: Option<bool>,
    pub history_size: usize,
    pub redact_history_info: bool,
    pub persist_history: bool,
    pub prompt: String,
    pub continuation_prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            block_on_newline_by_default: true,
            interrupt_enabled: true,
            terminal_is_interactive: None,
            history_size: HISTORY_SIZE_MAX,
            redact_history_info: false,
            persist_history: false,
            prompt: DEFAULT_PROMPT.to_string(),
            continuation_prompt: DEFAULT_CONTINUATION_PROMPT.to_string(),
        }
    }
}

impl ReplConfig {
    /// # Errors
    ///
    /// If the file can't be read or isn't valid JSON.
    pub fn try_load(path: &Path) -> miette::Result<Self> {
        let content = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not parse config file {}", path.display()))
    }

    /// Loads from the default location if that file exists, otherwise returns the
    /// defaults.
    ///
    /// # Errors
    ///
    /// If the file exists but can't be loaded.
    pub fn try_load_default() -> miette::Result<Self> {
        match try_get_config_file_path() {
            Some(path) if path.exists() => Self::try_load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// If the folder can't be created or the file can't be written.
    pub fn try_save(&self, path: &Path) -> miette::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        let content = serde_json::to_string_pretty(self).into_diagnostic()?;
        fs::write(path, content)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not write config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ReplConfig::default();
        assert!(config.block_on_newline_by_default);
        assert!(config.interrupt_enabled);
        assert_eq!(config.terminal_is_interactive, None);
        assert_eq!(config.history_size, 1_000);
        assert_eq!(config.prompt, "> ");
        assert_eq!(config.continuation_prompt, "... ");
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "history_size": 5, "prompt": "calc> " }"#).unwrap();

        let config = ReplConfig::try_load(&path).unwrap();
        assert_eq!(
            config,
            ReplConfig {
                history_size: 5,
                prompt: "calc> ".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r3bl-repl").join("config.json");
        let config = ReplConfig {
            persist_history: true,
            terminal_is_interactive: Some(false),
            ..Default::default()
        };
        config.try_save(&path).unwrap();
        assert_eq!(ReplConfig::try_load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(ReplConfig::try_load(&path).is_err());
    }
}
