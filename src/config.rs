//! Optional YAML alias file extending the built-in header candidates.
//!
//! ```yaml
//! candidates:
//!   views: ["Plays"]
//!   title: ["Content"]
//! ```
//!
//! Aliases listed for a role are tried before that role's built-in candidates.

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    roles::Role,
};

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    #[serde(default)]
    pub candidates: BTreeMap<Role, Vec<String>>,
}

impl AliasConfig {
    pub fn load(path: &Path) -> AnalyticsResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| AnalyticsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> AnalyticsResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AliasConfig =
            serde_yaml::from_str(text).map_err(|err| AnalyticsError::Config(err.to_string()))?;
        for (role, aliases) in &config.candidates {
            if aliases.iter().any(|alias| alias.trim().is_empty()) {
                return Err(AnalyticsError::Config(format!(
                    "Empty alias listed for role '{role}'"
                )));
            }
        }
        Ok(config)
    }

    pub fn candidates_for(&self, role: Role) -> Vec<String> {
        let mut candidates = self
            .candidates
            .get(&role)
            .cloned()
            .unwrap_or_default();
        candidates.extend(role.default_candidates().iter().map(|c| c.to_string()));
        candidates
    }
}
