//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/whatnext/whatnext.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `WHATNEXT_*` prefix
//!
//! Command line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::VisitPolicy;

/// Raw policy for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPolicy {
    pub growth_ceiling: Option<u32>,
    pub partition_floor: Option<u32>,
    pub partition_ceiling: Option<u32>,
    pub reinforce: Option<f64>,
    pub penalize: Option<f64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub tree_file: Option<PathBuf>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub policy: RawPolicy,
}

/// Unified configuration for whatnext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Where the tree is persisted (default: `<data dir>/whatnext/tree.json`)
    pub tree_file: PathBuf,
    /// Fixed random seed for reproducible sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Traversal tunables
    pub policy: VisitPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tree_file: default_tree_file(),
            seed: None,
            policy: VisitPolicy::default(),
        }
    }
}

fn default_tree_file() -> PathBuf {
    ProjectDirs::from("", "", "whatnext")
        .map(|dirs| dirs.data_dir().join("tree.json"))
        .unwrap_or_else(|| PathBuf::from("tree.json"))
}

/// Get the XDG config directory for whatnext.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "whatnext").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("whatnext.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path; unknown variables leave it as is.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl RawPolicy {
    fn apply_to(&self, base: VisitPolicy) -> VisitPolicy {
        VisitPolicy {
            growth_ceiling: self.growth_ceiling.unwrap_or(base.growth_ceiling),
            partition_floor: self.partition_floor.unwrap_or(base.partition_floor),
            partition_ceiling: self.partition_ceiling.unwrap_or(base.partition_ceiling),
            reinforce: self.reinforce.unwrap_or(base.reinforce),
            penalize: self.penalize.unwrap_or(base.penalize),
        }
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            tree_file: overlay
                .tree_file
                .clone()
                .unwrap_or_else(|| self.tree_file.clone()),
            seed: overlay.seed.or(self.seed),
            policy: overlay.policy.apply_to(self.policy),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; must exist if given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply WHATNEXT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("WHATNEXT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("tree_file") {
            settings.tree_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_int("seed") {
            settings.seed = Some(u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("seed must not be negative, got {val}"),
            })?);
        }
        if let Ok(val) = config.get_int("policy.growth_ceiling") {
            settings.policy.growth_ceiling = to_u32("policy.growth_ceiling", val)?;
        }
        if let Ok(val) = config.get_int("policy.partition_floor") {
            settings.policy.partition_floor = to_u32("policy.partition_floor", val)?;
        }
        if let Ok(val) = config.get_int("policy.partition_ceiling") {
            settings.policy.partition_ceiling = to_u32("policy.partition_ceiling", val)?;
        }
        if let Ok(val) = config.get_float("policy.reinforce") {
            settings.policy.reinforce = val;
        }
        if let Ok(val) = config.get_float("policy.penalize") {
            settings.policy.penalize = val;
        }

        Ok(settings)
    }

    fn expand_paths(&mut self) {
        self.tree_file = expand_path(&self.tree_file);
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.policy
            .validate()
            .map_err(|e| ApplicationError::Config {
                message: e.to_string(),
            })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# whatnext configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/whatnext/whatnext.toml
#   File:   --config <path>
#   Env:    WHATNEXT_* environment variables (WHATNEXT_POLICY__REINFORCE=0.3)

# Where the decision tree is stored
# tree_file = "~/.local/share/whatnext/tree.json"

# Fixed random seed (reproducible suggestions)
# seed = 42

[policy]
# A child is offered when a draw in [0, growth_ceiling] >= number of children
# growth_ceiling = 20

# Regrouping is offered when a draw in [partition_floor, partition_ceiling]
# is below the number of children plus leaves
# partition_floor = 10
# partition_ceiling = 30

# Relative weight change for "super" and "no" answers
# reinforce = 0.2
# penalize = 0.2
"#
        .to_string()
    }
}

fn to_u32(key: &str, val: i64) -> Result<u32, ApplicationError> {
    u32::try_from(val).map_err(|_| ApplicationError::Config {
        message: format!("{key} out of range: {val}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_then_tree_file_is_json() {
        let settings = Settings::default();
        assert_eq!(
            settings.tree_file.extension().and_then(|e| e.to_str()),
            Some("json")
        );
        assert_eq!(settings.policy, VisitPolicy::default());
        assert!(settings.seed.is_none());
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            tree_file: Some(PathBuf::from("/tmp/t.json")),
            seed: Some(9),
            policy: RawPolicy {
                reinforce: Some(0.5),
                ..Default::default()
            },
        };

        let result = base.merge_with(&overlay);

        assert_eq!(result.tree_file, PathBuf::from("/tmp/t.json"));
        assert_eq!(result.seed, Some(9));
        assert_eq!(result.policy.reinforce, 0.5);
        assert_eq!(result.policy.penalize, 0.2);
        assert_eq!(result.policy.growth_ceiling, 20);
    }

    #[test]
    fn given_tilde_in_tree_file_when_expanding_then_uses_home() {
        let mut settings = Settings {
            tree_file: PathBuf::from("~/tree.json"),
            ..Default::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.tree_file.starts_with(&home));
    }

    #[test]
    fn given_settings_when_rendering_toml_then_has_policy_table() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("tree_file"));
        assert!(toml.contains("[policy]"));
        assert!(!toml.contains("seed"));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.tree_file.is_none());
    }
}
