//! chainlift-deploy - Multi-chain token deployment orchestration.
//!
//! Given a funded signing key, this crate deploys a compiled token contract
//! to one or more EVM networks, waits for on-chain confirmation, and
//! registers each deployed contract with the network's source-verification
//! service.
//!
//! The flow for one network is a fixed stage sequence -- inspect the
//! account, broadcast the creation transaction, wait for confirmation,
//! register for verification -- driven by [`Pipeline`]; [`run_campaign`]
//! loops it over an ordered list of target networks, isolating failures
//! per target.

pub mod artifact;
pub mod campaign;
pub mod config;
pub mod confirm;
pub mod error;
pub mod inspect;
pub mod network;
pub mod pipeline;
pub mod signer;
pub mod submit;
pub mod verify;

pub use artifact::{ConstructorArgs, ContractArtifact};
pub use campaign::{CampaignReport, run_campaign};
pub use config::{CAMPAIGN_FILENAME, CampaignConfig, TargetConfig};
pub use confirm::{ConfirmedDeployment, await_confirmation};
pub use error::DeployError;
pub use inspect::{AccountReport, inspect};
pub use network::{Credentials, Network, NetworkContext};
pub use pipeline::{
    CancelFlag, DeploymentOutcome, DeploymentRecord, Pipeline, PipelineSettings, Stage,
};
pub use signer::{DeploymentReceipt, PendingDeployment, RpcSigner, Signer};
pub use submit::submit;
pub use verify::{
    CompilerSettings, EtherscanClient, VerificationApi, VerificationOutcome, VerificationRequest,
    VerifyPolicy, register,
};
