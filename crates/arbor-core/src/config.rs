//! Global configuration for arbor.
//!
//! Configuration is resolved with the following precedence (highest to
//! lowest): CLI flags, environment variables (`ARBOR_ROOT`), the global
//! config file (`~/.arbor/config.yaml`), built-in defaults. This module
//! only handles the file layer; flag/env precedence lives in the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{ARBOR_HOME_DIR, GLOBAL_CONFIG_FILENAME};
use crate::errors::ArborError;

/// Global configuration loaded from `~/.arbor/config.yaml`.
///
/// A missing file yields the defaults; an unreadable or malformed file is
/// an error, not silently defaulted, so typos surface instead of being
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArborConfig {
    /// Default graph root, used when neither `--root` nor `ARBOR_ROOT` is
    /// given. Relative values are resolved against the current directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl ArborConfig {
    /// Path of the global configuration file, if a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(ARBOR_HOME_DIR).join(GLOBAL_CONFIG_FILENAME))
    }

    /// Load the global configuration, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self, ArborError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ArborError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, ArborError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ArborError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&text).map_err(|e| {
            ArborError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
