//! App-runner registry: the alias table behind `CREATE(alias)`.
//!
//! # File format
//!
//! One `alias::command line` entry per line.  Blank lines and lines starting
//! with `#` are ignored; a later entry for the same alias wins.
//!
//! ```text
//! # browsers
//! firefox::firefox --new-window
//! term::alacritty -e htop
//! ```

use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::process::{Child, Command, Stdio};

const SEPARATOR: &str = "::";

/// Errors from loading a registry file.
#[derive(Debug, thiserror::Error)]
pub enum AppRegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `alias::command`, got {text:?}")]
    Malformed { line: usize, text: String },
}

/// Maps app aliases to command lines.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: HashMap<String, String>,
}

impl AppRegistry {
    /// Parse registry text.
    pub fn parse(text: &str) -> Result<Self, AppRegistryError> {
        let mut apps = HashMap::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || AppRegistryError::Malformed {
                line: i + 1,
                text: line.to_string(),
            };
            let (alias, command) = line.split_once(SEPARATOR).ok_or_else(malformed)?;
            let (alias, command) = (alias.trim(), command.trim());
            if alias.is_empty() || command.is_empty() {
                return Err(malformed());
            }
            apps.insert(alias.to_string(), command.to_string());
        }
        Ok(Self { apps })
    }

    /// Load a registry file.  A missing file yields an empty registry.
    pub fn load(path: &Path) -> Result<Self, AppRegistryError> {
        if !path.exists() {
            info!("no app registry at {}, CREATE is unavailable", path.display());
            return Ok(Self::default());
        }
        let registry = Self::parse(&std::fs::read_to_string(path)?)?;
        info!("loaded {} app(s) from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Command line registered for `alias`.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.apps.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Spawn `command_line`, detached from our stdio.
    ///
    /// The line is split on whitespace into the program and its arguments.
    pub fn spawn(command_line: &str) -> std::io::Result<Child> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
        })?;
        debug!("spawning {:?}", command_line);
        Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_aliases() {
        let reg = AppRegistry::parse(
            "# comment\n\nfirefox::firefox --new-window\n term :: alacritty -e htop \n",
        )
        .unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.resolve("firefox"), Some("firefox --new-window"));
        assert_eq!(reg.resolve("term"), Some("alacritty -e htop"));
        assert_eq!(reg.resolve("chrome"), None);
    }

    #[test]
    fn later_duplicates_win() {
        let reg = AppRegistry::parse("a::one\na::two").unwrap();
        assert_eq!(reg.resolve("a"), Some("two"));
    }

    #[test]
    fn command_may_contain_the_separator() {
        let reg = AppRegistry::parse("ssh::ssh host::port").unwrap();
        assert_eq!(reg.resolve("ssh"), Some("ssh host::port"));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = AppRegistry::parse("ok::true\nbroken line").unwrap_err();
        assert!(matches!(err, AppRegistryError::Malformed { line: 2, .. }));
        assert!(AppRegistry::parse("::cmd").is_err());
        assert!(AppRegistry::parse("alias::").is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "t::true").unwrap();
        let reg = AppRegistry::load(file.path()).unwrap();
        assert_eq!(reg.resolve("t"), Some("true"));
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let reg = AppRegistry::load(&dir.path().join("apps")).unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn spawn_runs_the_program() {
        let mut child = AppRegistry::spawn("true").unwrap();
        assert!(child.wait().unwrap().success());
        assert!(AppRegistry::spawn("   ").is_err());
    }
}
