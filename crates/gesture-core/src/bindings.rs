//! Action bindings: gesture name or combo key to shell command.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ConfigLoadError;

/// Resolves a gesture name or combo key to a command. `None` means unbound.
pub trait ActionResolver {
    fn resolve(&self, key: &str) -> Option<&str>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionBindings {
    actions: HashMap<String, String>,
}

impl ActionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, command: impl Into<String>) {
        self.actions.insert(key.into(), command.into());
    }

    pub fn with(mut self, key: impl Into<String>, command: impl Into<String>) -> Self {
        self.insert(key, command);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Non-string or blank commands are skipped with a warning.
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        let entries: Map<String, Value> = serde_json::from_str(source)?;
        let mut bindings = Self::new();

        for (key, value) in entries {
            match value {
                Value::String(command) if !command.trim().is_empty() => {
                    bindings.insert(key, command);
                }
                other => {
                    let err = ConfigLoadError::InvalidEntry {
                        name: key,
                        reason: format!("expected a command string, got {other}"),
                    };
                    warn!(error = %err, "skipping action binding");
                }
            }
        }

        Ok(bindings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::from_io(path, e))?;
        Self::parse(&raw).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads bindings, degrading to an empty map on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(bindings) => {
                info!(path = %path.display(), count = bindings.len(), "loaded action mappings");
                bindings
            }
            Err(err) => {
                warn!(error = %err, "action bindings unavailable, nothing will fire");
                Self::new()
            }
        }
    }
}

impl ActionResolver for ActionBindings {
    fn resolve(&self, key: &str) -> Option<&str> {
        self.actions.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolves_gestures_and_combos() {
        let bindings = ActionBindings::parse(
            r#"{"FIST": "playerctl play-pause", "ONE-TWO": "gnome-screenshot"}"#,
        )
        .unwrap();
        assert_eq!(bindings.resolve("FIST"), Some("playerctl play-pause"));
        assert_eq!(bindings.resolve("ONE-TWO"), Some("gnome-screenshot"));
        assert_eq!(bindings.resolve("TWO"), None);
    }

    #[test]
    fn non_string_commands_are_skipped() {
        let bindings =
            ActionBindings::parse(r#"{"FIST": 3, "FIVE": "  ", "ONE": "echo one"}"#).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.resolve("ONE"), Some("echo one"));
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.json");
        assert!(matches!(
            ActionBindings::load(&path),
            Err(ConfigLoadError::NotFound { .. })
        ));
        assert!(ActionBindings::load_or_empty(&path).is_empty());
    }

    #[test]
    fn malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            ActionBindings::load(&path),
            Err(ConfigLoadError::Parse { .. })
        ));
        assert!(ActionBindings::load_or_empty(&path).is_empty());
    }
}
