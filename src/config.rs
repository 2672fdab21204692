//! Configuration Management
//!
//! Handles persistent configuration storage for awsrecon.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Wait timeouts and poll intervals, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    /// VPC link create/update until AVAILABLE
    pub vpc_link_available_secs: u64,
    pub vpc_link_available_poll_secs: u64,
    /// VPC link delete until gone
    pub vpc_link_deleted_secs: u64,
    pub vpc_link_deleted_poll_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            vpc_link_available_secs: 8 * 60,
            vpc_link_available_poll_secs: 3,
            vpc_link_deleted_secs: 5 * 60,
            vpc_link_deleted_poll_secs: 1,
        }
    }
}

impl Timeouts {
    pub fn vpc_link_available(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.vpc_link_available_secs),
            Duration::from_secs(self.vpc_link_available_poll_secs),
        )
    }

    pub fn vpc_link_deleted(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.vpc_link_deleted_secs),
            Duration::from_secs(self.vpc_link_deleted_poll_secs),
        )
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// AWS region
    #[serde(default)]
    pub region: Option<String>,
    /// AWS partition (aws, aws-cn, aws-us-gov)
    #[serde(default)]
    pub partition: Option<String>,
    /// Account ID, needed for execute-api ARNs
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awsrecon").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective region (CLI > config > environment > us-east-1)
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| "us-east-1".to_string())
    }

    /// Get effective partition, derived from the region when unset
    pub fn effective_partition(&self) -> String {
        if let Some(partition) = &self.partition {
            return partition.clone();
        }
        partition_for_region(&self.effective_region()).to_string()
    }

    /// Set region and save
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }
}

fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}
