use crate::classify::{normalize_path, Classifier, PathOverride};
use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// UpdateConfig
// ---------------------------------------------------------------------------

/// Settings for `aif update`, read from `.ai-framework/update.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Keep the framework text of merge-eligible files so later updates can
    /// merge disjoint edits instead of flagging every difference.
    #[serde(default)]
    pub retain_baselines: bool,

    /// Extra classification rules, checked before the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<PathOverride>,
}

impl UpdateConfig {
    /// Load the config, or the defaults when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let Some(data) = io::read_optional(&paths::update_config_path(root))? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: UpdateConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::update_config_path(root), data.as_bytes())
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::default().with_overrides(&self.overrides)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for o in &self.overrides {
            let prefix = normalize_path(&o.prefix);
            if prefix.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "override with empty prefix (category {}) is ignored",
                        o.category
                    ),
                });
                continue;
            }
            if !seen.insert(prefix.clone()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "duplicate override prefix '{prefix}': only the first one applies"
                    ),
                });
            }
        }

        warnings
    }
}
