//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/wizarddes/config.json`.  Every section is optional, so a
//! minimal `{}` file is valid and all values fall back to their compiled-in
//! defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "backend": "ewmh",
//!   "execution": {
//!     "mutation_delay_ms": 200,
//!     "wait_default_secs": 5,
//!     "create_timeout_ms": 2000,
//!     "create_poll_ms": 250,
//!     "create_detect_timeout_ms": 30000
//!   },
//!   "apps_file": "/home/me/.config/wizarddes/apps",
//!   "batch_delimiter": ";"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which [`WindowSystem`](crate::traits::WindowSystem) implementation to
/// bind at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shell out to the `wmctrl` binary.
    #[default]
    Wmctrl,
    /// Talk EWMH to the X server directly.
    Ewmh,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,

    /// Timing of query execution.
    pub execution: ExecutionConfig,

    /// App-runner registry used by `CREATE` / `FORCE_CREATE`.  Defaults to
    /// `apps` next to the config file.
    pub apps_file: Option<PathBuf>,

    /// Separator between queries given with `--batch`.
    pub batch_delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            execution: ExecutionConfig::default(),
            apps_file: None,
            batch_delimiter: ';',
        }
    }
}

/// Timing of query execution.
///
/// Durations are in **milliseconds** unless the name says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Pause after every move/close so the window manager can apply it
    /// before the next read.
    pub mutation_delay_ms: u64,
    /// Seconds slept by `WAIT(*)` or a negative `WAIT`.
    pub wait_default_secs: u64,
    /// How long `CREATE` waits for the launched process to exit before it
    /// starts looking for the new window.
    pub create_timeout_ms: u64,
    /// Interval between window-list polls while `CREATE` looks for the new
    /// window.
    pub create_poll_ms: u64,
    /// Upper bound for the window detection phase of `CREATE`.  `None`
    /// waits as long as the launched processes are alive.
    pub create_detect_timeout_ms: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mutation_delay_ms: 200,
            wait_default_secs: 5,
            create_timeout_ms: 2000,
            create_poll_ms: 250,
            create_detect_timeout_ms: None,
        }
    }
}

impl ExecutionConfig {
    /// Zero delays everywhere; handy for tests and dry backends.
    pub fn immediate() -> Self {
        Self {
            mutation_delay_ms: 0,
            wait_default_secs: 0,
            create_timeout_ms: 0,
            create_poll_ms: 0,
            create_detect_timeout_ms: None,
        }
    }

    pub fn mutation_delay(&self) -> Duration {
        Duration::from_millis(self.mutation_delay_ms)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/wizarddes`).
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("wizarddes")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "backend": "ewmh",
            "execution": {
                "mutation_delay_ms": 50,
                "wait_default_secs": 2,
                "create_timeout_ms": 1000,
                "create_poll_ms": 100,
                "create_detect_timeout_ms": 30000
            },
            "apps_file": "/etc/wizarddes/apps",
            "batch_delimiter": "|"
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.backend, Backend::Ewmh);
        assert_eq!(cfg.execution.mutation_delay_ms, 50);
        assert_eq!(cfg.execution.wait_default_secs, 2);
        assert_eq!(cfg.execution.create_timeout_ms, 1000);
        assert_eq!(cfg.execution.create_poll_ms, 100);
        assert_eq!(cfg.execution.create_detect_timeout_ms, Some(30000));
        assert_eq!(cfg.apps_file, Some(PathBuf::from("/etc/wizarddes/apps")));
        assert_eq!(cfg.batch_delimiter, '|');
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.backend, Backend::Wmctrl);
        assert_eq!(cfg.execution, ExecutionConfig::default());
        assert_eq!(cfg.apps_file, None);
        assert_eq!(cfg.batch_delimiter, ';');
    }

    #[test]
    fn deserialize_partial_execution() {
        let json = r#"{ "execution": { "wait_default_secs": 9 } }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.execution.wait_default_secs, 9);
        let defaults = ExecutionConfig::default();
        assert_eq!(cfg.execution.mutation_delay_ms, defaults.mutation_delay_ms);
        assert_eq!(cfg.execution.create_detect_timeout_ms, None);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "backend": "wmctrl", "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn unknown_backend_is_an_error() {
        assert!(serde_json::from_str::<Config>(r#"{ "backend": "wayland" }"#).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "backend": "ewmh" }}"#).unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.backend, Backend::Ewmh);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
