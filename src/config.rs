//! Runner configuration (`caseforge.json`).
//!
//! The file is optional. When `--config` is not given, a `caseforge.json` next to the manifest is
//! used if present. Command-line flags are applied on top of the file.

use std::fs;
use std::path::{Path, PathBuf};

use caseforge_core::{DiscoveryOptions, MethodDisplay, MethodDisplayOptions};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "caseforge.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("invalid config '{path}': {source}")]
    Parse { path: String, source: serde_json::Error },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MethodDisplaySetting {
    #[default]
    ClassAndMethod,
    Method,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodDisplayOptionsSetting {
    #[serde(default)]
    pub replace_underscore_with_space: bool,
    #[serde(default)]
    pub replace_period_with_comma: bool,
}

/// Contents of `caseforge.json`; every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RunnerConfig {
    pub pre_enumerate_theories: Option<bool>,
    pub method_display: Option<MethodDisplaySetting>,
    pub method_display_options: Option<MethodDisplayOptionsSetting>,
    /// Report discovery diagnostics to the user.
    pub diagnostic_messages: Option<bool>,
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<RunnerConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<RunnerConfig, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load the explicit config, or the one beside `manifest`, or fall back to defaults.
    ///
    /// Returns the path that was actually read, since it contributes to the assembly id.
    pub fn locate(explicit: Option<&Path>, manifest: &Path) -> Result<(RunnerConfig, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let beside = manifest
            .parent()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        if beside.is_file() {
            tracing::debug!(path = %beside.display(), "using config beside manifest");
            return Ok((Self::load(&beside)?, Some(beside)));
        }
        Ok((RunnerConfig::default(), None))
    }

    pub fn diagnostic_messages(&self) -> bool {
        self.diagnostic_messages.unwrap_or(false)
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        let mut options = DiscoveryOptions::default();
        if let Some(enabled) = self.pre_enumerate_theories {
            options = options.with_pre_enumerate_theories(enabled);
        }
        if let Some(display) = self.method_display {
            options = options.with_method_display(display.into());
        }
        if let Some(display_options) = self.method_display_options {
            options = options.with_method_display_options(MethodDisplayOptions {
                replace_underscore_with_space: display_options.replace_underscore_with_space,
                replace_period_with_comma: display_options.replace_period_with_comma,
            });
        }
        options
    }
}

impl From<MethodDisplaySetting> for MethodDisplay {
    fn from(setting: MethodDisplaySetting) -> Self {
        match setting {
            MethodDisplaySetting::ClassAndMethod => MethodDisplay::ClassAndMethod,
            MethodDisplaySetting::Method => MethodDisplay::Method,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<RunnerConfig, ConfigError> {
        RunnerConfig::parse(text, Path::new("caseforge.json"))
    }

    #[test]
    fn test_empty_config_keeps_defaults() {
        let config = parse("{}").unwrap();
        assert_eq!(config.discovery_options(), DiscoveryOptions::default());
        assert!(!config.diagnostic_messages());
    }

    #[test]
    fn test_config_maps_to_options() {
        let config = parse(
            r#"{
                "preEnumerateTheories": false,
                "methodDisplay": "method",
                "methodDisplayOptions": { "replaceUnderscoreWithSpace": true },
                "diagnosticMessages": true
            }"#,
        )
        .unwrap();
        let options = config.discovery_options();
        assert!(!options.pre_enumerate_theories);
        assert_eq!(options.method_display, MethodDisplay::Method);
        assert!(options.method_display_options.replace_underscore_with_space);
        assert!(config.diagnostic_messages());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse(r#"{"preEnumerate": true}"#).unwrap_err();
        assert!(err.to_string().contains("preEnumerate"));
    }

    #[test]
    fn test_missing_beside_file_falls_back_to_defaults() {
        let manifest = std::env::temp_dir().join("caseforge-no-such-dir").join("manifest.json");
        let (config, path) = RunnerConfig::locate(None, &manifest).unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert!(path.is_none());
    }
}
