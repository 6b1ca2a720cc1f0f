use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::lints;
use crate::visit::keys::{Fallback, VisitorKeys};

/// Default configuration file name looked up next to the input.
pub const CONFIG_FILE: &str = "treepass.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config{}: {source}", path_suffix(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown lint '{name}' (known: {})", lints::NAMES.join(", "))]
    UnknownLint { name: String },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

/// Contents of `treepass.toml`.
///
/// ```toml
/// [walk]
/// fallback = "fields"
/// leaves = ["JSXText"]
///
/// [walk.keys]
/// JSXElement = ["openingElement", "children", "closingElement"]
///
/// [lints]
/// enabled = ["no-debugger", "shadowing"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub walk: WalkConfig,
    #[serde(default)]
    pub lints: LintConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkConfig {
    #[serde(default)]
    pub fallback: Fallback,
    /// Kinds that never have children.
    #[serde(default)]
    pub leaves: Vec<String>,
    /// Extra or overriding child keys, per kind.
    #[serde(default)]
    pub keys: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Config = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: Some(path.to_path_buf()), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `treepass.toml` from `dir` if there is one.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.lints.enabled.iter().find(|name| lints::by_name(name).is_none()) {
            Some(name) => Err(ConfigError::UnknownLint { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// ESTree keys with this config's leaves, key overrides and fallback
    /// applied on top.
    pub fn visitor_keys(&self) -> VisitorKeys {
        let mut keys = VisitorKeys::estree().with_fallback(self.walk.fallback);
        for leaf in &self.walk.leaves {
            keys.register_leaf(leaf.as_str());
        }
        for (kind, fields) in &self.walk.keys {
            keys.register(kind.as_str(), fields.iter().map(String::as_str));
        }
        keys
    }
}
