//! Campaign configuration.
//!
//! A campaign is the artifact to deploy plus an ordered list of target
//! networks, with the timing knobs the pipeline runs under. It can be
//! assembled programmatically (the CLI does this from flags) or loaded
//! from a `Chainlift.toml` file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::{Address, utils::parse_ether};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::DeployError,
    network::Network,
    pipeline::PipelineSettings,
    verify::{CompilerSettings, VerifyPolicy},
};

/// The default name for the campaign configuration file.
pub const CAMPAIGN_FILENAME: &str = "Chainlift.toml";

/// One target network entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub network: Network,
    /// Vesting beneficiary; defaults to the campaign-level beneficiary,
    /// then to the signing account itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Address>,
    /// Remote messaging endpoint; defaults per network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_endpoint: Option<Address>,
    /// RPC endpoint override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
}

impl TargetConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            beneficiary: None,
            remote_endpoint: None,
            rpc_url: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_balance_eth() -> String {
    "0.01".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    300
}

fn default_confirm_poll_secs() -> u64 {
    5
}

fn default_cooldown_secs() -> u64 {
    60
}

/// Full campaign description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Path to the compiled contract artifact (Hardhat JSON layout).
    pub artifact: PathBuf,
    /// Default beneficiary for targets that do not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Address>,
    /// Whether to register deployments with the verification service.
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Balance floor in native-token units checked before committing funds.
    #[serde(default = "default_min_balance_eth")]
    pub min_balance_eth: String,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "default_confirm_poll_secs")]
    pub confirm_poll_secs: u64,
    /// Cool-down before the first verification attempt.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default)]
    pub compiler: CompilerSettings,
    /// Target networks, in deployment order.
    #[serde(rename = "target")]
    pub targets: Vec<TargetConfig>,
}

impl CampaignConfig {
    /// Load the configuration from a TOML file. A directory path is
    /// resolved to the default file name inside it.
    pub fn load_from_file(path: &Path) -> Result<Self, DeployError> {
        if !path.exists() {
            return Err(DeployError::Configuration(format!(
                "configuration file or directory not found: {}",
                path.display()
            )));
        }

        let config_path = if path.is_dir() {
            path.join(CAMPAIGN_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            DeployError::Configuration(format!(
                "failed to read config from {}: {e}",
                config_path.display()
            ))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DeployError::Configuration(format!("failed to parse config file: {e}")))?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), DeployError> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            DeployError::Configuration(format!("failed to serialize config to TOML: {e}"))
        })?;
        std::fs::write(path, content).map_err(|e| {
            DeployError::Configuration(format!(
                "failed to write config to {}: {e}",
                path.display()
            ))
        })?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Reject campaigns that cannot run: no targets, or the same network
    /// listed twice (which would deploy the contract twice and spend gas
    /// twice).
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.targets.is_empty() {
            return Err(DeployError::Configuration(
                "campaign has no target networks".into(),
            ));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.network) {
                return Err(DeployError::Configuration(format!(
                    "network '{}' is listed twice; each network deploys at most once per run",
                    target.network
                )));
            }
        }
        Ok(())
    }

    /// Pipeline settings derived from the campaign knobs.
    pub fn settings(&self) -> Result<PipelineSettings, DeployError> {
        let min_balance = parse_ether(&self.min_balance_eth).map_err(|e| {
            DeployError::Configuration(format!(
                "invalid min_balance_eth '{}': {e}",
                self.min_balance_eth
            ))
        })?;
        Ok(PipelineSettings {
            min_balance,
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            confirm_poll_interval: Duration::from_secs(self.confirm_poll_secs),
            verify: VerifyPolicy {
                cooldown: Duration::from_secs(self.cooldown_secs),
                ..VerifyPolicy::default()
            },
            compiler: self.compiler.clone(),
            ..PipelineSettings::default()
        })
    }
}
