//! Failure taxonomy for the deployment pipeline.

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Errors surfaced by the deployment pipeline stages.
///
/// Variants split along retry boundaries: [`DeployError::is_transient`]
/// marks the kinds a caller may retry with backoff; everything else is
/// fatal for the current network's pipeline.
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    /// Bad or missing configuration. Fails before any network I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No signing key is available for the target network.
    #[error("no signing key available for network '{network}': set {env_var}")]
    NoSignerAvailable {
        network: String,
        env_var: &'static str,
    },

    /// An RPC endpoint or the verification service could not be reached,
    /// or rejected a request outright.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The signing account cannot cover the deployment.
    #[error(
        "insufficient funds: account {address} holds {available} wei, \
         at least {required} wei required"
    )]
    InsufficientFunds {
        address: Address,
        available: U256,
        required: U256,
    },

    /// The deployment transaction was not mined within the configured
    /// window. It may still confirm later.
    #[error(
        "transaction {tx_hash} not confirmed after {waited_secs}s; it may \
         still be pending -- check the explorer before assuming failure"
    )]
    ConfirmationTimeout { tx_hash: B256, waited_secs: u64 },

    /// The deployment transaction was mined but reverted.
    #[error("deployment transaction {0} reverted")]
    Reverted(B256),

    /// The verification service rejected the contract. The deployment
    /// itself is unaffected and stays live.
    #[error("verification failed for {address}: {reason}")]
    VerificationFailed { address: Address, reason: String },

    /// The operator interrupted the run at a stage boundary.
    #[error("deployment cancelled before {stage}")]
    Cancelled { stage: &'static str },
}

impl DeployError {
    /// Whether the error is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeployError::NetworkUnavailable(_))
    }

    /// Whether the deployed contract is live despite the error.
    pub fn contract_is_live(&self) -> bool {
        matches!(self, DeployError::VerificationFailed { .. })
    }
}
