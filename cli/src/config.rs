use anyhow::Result;
use pfm_feed::FeedConfig;
use pfm_risk::RiskConfig;
use pfm_storage::StorageConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_refresh_interval_sec")]
    pub refresh_interval_sec: u64,
}

impl SchedulerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_sec)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_sec: default_refresh_interval_sec(),
        }
    }
}

fn default_refresh_interval_sec() -> u64 {
    900
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.risk.validate()?;
        config.feed.validate()?;
        config.storage.validate()?;
        if config.scheduler.refresh_interval_sec == 0 {
            anyhow::bail!("scheduler.refresh_interval_sec must be positive");
        }
        Ok(config)
    }
}
