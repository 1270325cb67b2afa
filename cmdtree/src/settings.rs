//! Manager settings
//!
//! ```json
//! {
//!   "case_sensitive": false,
//!   "ambiguity_policy": "strict",
//!   "command_prefix": "/",
//!   "max_suggestions": 20
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How sibling nodes that cannot be told apart by syntax are treated at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// An argument node may not have any sibling
    Strict,
    /// One argument node may sit next to literals; literals are tried first
    #[default]
    LiteralPrecedence,
    /// Any number of argument siblings, tried in insertion order
    Permissive,
}

/// Settings for a [`CommandManager`](crate::CommandManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Match literals exactly; when false, ASCII case is ignored
    pub case_sensitive: bool,
    /// Treatment of ambiguous siblings
    pub ambiguity_policy: AmbiguityPolicy,
    /// Marker stripped from the first token, such as `/`
    pub command_prefix: Option<String>,
    /// Upper bound on returned suggestions
    pub max_suggestions: Option<usize>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            ambiguity_policy: AmbiguityPolicy::default(),
            command_prefix: None,
            max_suggestions: None,
        }
    }
}

/// Failure to read settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ManagerSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), ?settings, "Settings loaded");
        Ok(settings)
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_ambiguity_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity_policy = policy;
        self
    }

    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = Some(prefix.into());
        self
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = Some(max);
        self
    }
}
