use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, StorageError};

/// Ledger storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot loaded on open (`.yaml`/`.yml` or `.json`)
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Write the snapshot back to `seed_file` after every change
    #[serde(default)]
    pub autosave: bool,
}

impl StorageConfig {
    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: StorageConfig =
            serde_yaml::from_str(yaml).map_err(|e| StorageError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.autosave && self.seed_file.is_none() {
            return Err(StorageError::ConfigError(
                "autosave requires seed_file".to_string(),
            ));
        }
        Ok(())
    }
}
