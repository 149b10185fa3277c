use std::path::PathBuf;

use alloy_primitives::Address;
use clap::Parser;
use tracing::level_filters::LevelFilter;

use chainlift_deploy::{CampaignConfig, Network, TargetConfig};

#[derive(Parser)]
#[command(name = "chainlift")]
#[command(
    author,
    version,
    about = "Deploy a token contract across chains and register it for source verification"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "CHAINLIFT_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to an existing Chainlift.toml campaign file to load.
    ///
    /// When provided, targets and deployment knobs come from the file and
    /// the flags below are ignored.
    #[arg(long, alias = "conf", env = "CHAINLIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target networks, in deployment order.
    #[arg(
        long,
        alias = "network",
        value_delimiter = ',',
        env = "CHAINLIFT_NETWORKS",
        default_value = "local"
    )]
    pub networks: Vec<Network>,

    /// Path to the compiled contract artifact (Hardhat JSON layout).
    #[arg(long, env = "CHAINLIFT_ARTIFACT", required_unless_present = "config")]
    pub artifact: Option<PathBuf>,

    /// Vesting beneficiary address.
    ///
    /// If not provided, the signing account itself is the beneficiary.
    #[arg(long, env = "CHAINLIFT_BENEFICIARY")]
    pub beneficiary: Option<Address>,

    /// Remote messaging endpoint override, applied to every target.
    ///
    /// If not provided, each network uses its known endpoint address.
    #[arg(long, env = "CHAINLIFT_REMOTE_ENDPOINT")]
    pub remote_endpoint: Option<Address>,

    /// Skip registration with the source-verification service.
    #[arg(long, env = "CHAINLIFT_NO_VERIFY")]
    pub no_verify: bool,

    /// Balance floor in native-token units checked before committing funds.
    #[arg(long, env = "CHAINLIFT_MIN_BALANCE", default_value = "0.01")]
    pub min_balance: String,

    /// Seconds to wait for the deployment transaction to be mined.
    #[arg(long, env = "CHAINLIFT_CONFIRM_TIMEOUT", default_value_t = 300)]
    pub confirm_timeout_secs: u64,

    /// Seconds between receipt polls while waiting for confirmation.
    #[arg(long, env = "CHAINLIFT_CONFIRM_POLL", default_value_t = 5)]
    pub confirm_poll_secs: u64,

    /// Seconds to wait after confirmation before the first verification
    /// attempt, covering the verification service's indexing lag.
    #[arg(long, env = "CHAINLIFT_COOLDOWN", default_value_t = 60)]
    pub cooldown_secs: u64,

    /// Write the resolved campaign configuration to this path before
    /// running.
    #[arg(long, env = "CHAINLIFT_SAVE_CONFIG")]
    pub save_config: Option<PathBuf>,
}

impl Cli {
    /// Assemble a campaign from the command-line flags.
    pub fn to_campaign(&self) -> CampaignConfig {
        let targets = self
            .networks
            .iter()
            .map(|&network| TargetConfig {
                remote_endpoint: self.remote_endpoint,
                ..TargetConfig::new(network)
            })
            .collect();

        CampaignConfig {
            artifact: self.artifact.clone().unwrap_or_default(),
            beneficiary: self.beneficiary,
            verify: !self.no_verify,
            min_balance_eth: self.min_balance.clone(),
            confirm_timeout_secs: self.confirm_timeout_secs,
            confirm_poll_secs: self.confirm_poll_secs,
            cooldown_secs: self.cooldown_secs,
            compiler: Default::default(),
            targets,
        }
    }
}
