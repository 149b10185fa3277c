//! Per-network deployment pipeline.
//!
//! One pipeline runs the fixed stage sequence for a single network:
//! inspect the account, broadcast the creation transaction, wait for
//! confirmation, register the contract for source verification. Stages are
//! strictly sequential -- each consumes the previous stage's output -- and
//! any stage error ends the run for that network.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use backon::{ExponentialBuilder, Retryable};

use crate::{
    artifact::{ConstructorArgs, ContractArtifact},
    confirm,
    error::DeployError,
    inspect::{self, AccountReport},
    network::{Network, NetworkContext},
    signer::Signer,
    submit,
    verify::{
        self, CompilerSettings, VerificationApi, VerificationOutcome, VerificationRequest,
        VerifyPolicy,
    },
};

/// Stages of one network's deployment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Init,
    Inspected,
    Submitted,
    Confirmed,
    Verified,
    Failed,
}

/// Cooperative cancellation flag, observed at stage boundaries only.
///
/// Once a transaction is broadcast the flag is no longer consulted until
/// confirmation completes: an in-flight deployment cannot be safely
/// abandoned.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &'static str) -> Result<(), DeployError> {
        if self.is_cancelled() {
            Err(DeployError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Balance floor checked after inspection, in wei. Deployment is not
    /// attempted below it.
    pub min_balance: U256,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
    pub verify: VerifyPolicy,
    pub compiler: CompilerSettings,
    /// Attempts for the transient-RPC retry around inspection.
    pub inspect_attempts: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_balance: U256::from(10u128.pow(16)),
            confirm_timeout: confirm::DEFAULT_CONFIRM_TIMEOUT,
            confirm_poll_interval: confirm::DEFAULT_POLL_INTERVAL,
            verify: VerifyPolicy::default(),
            compiler: CompilerSettings::default(),
            inspect_attempts: 3,
        }
    }
}

/// Progressive record of one network's deployment, for reporting. Each
/// field is filled exactly once as its stage completes; the transaction
/// hash is always recorded (and logged) before the contract address.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub network: Network,
    pub account: Option<AccountReport>,
    pub args: Option<ConstructorArgs>,
    pub tx_hash: Option<B256>,
    pub contract_address: Option<Address>,
    pub verification: Option<VerificationOutcome>,
}

impl DeploymentRecord {
    fn new(network: Network) -> Self {
        Self {
            network,
            account: None,
            args: None,
            tx_hash: None,
            contract_address: None,
            verification: None,
        }
    }
}

/// Terminal result of one network's pipeline.
#[derive(Debug)]
pub struct DeploymentOutcome {
    pub stage: Stage,
    pub record: DeploymentRecord,
    pub error: Option<DeployError>,
}

impl DeploymentOutcome {
    /// Build the outcome for a target that failed before its pipeline
    /// could start (context or signer resolution).
    pub fn failed_early(network: Network, error: DeployError) -> Self {
        Self {
            stage: Stage::Failed,
            record: DeploymentRecord::new(network),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// One network's deployment pipeline, ready to run.
pub struct Pipeline<'a, S, V> {
    pub ctx: &'a NetworkContext,
    pub signer: &'a S,
    /// Verification service for this network; `None` skips verification.
    pub verifier: Option<&'a V>,
    pub artifact: &'a ContractArtifact,
    pub args: ConstructorArgs,
    pub settings: &'a PipelineSettings,
    pub cancel: CancelFlag,
}

impl<S: Signer, V: VerificationApi> Pipeline<'_, S, V> {
    /// Run the pipeline to its terminal stage.
    pub async fn run(self) -> DeploymentOutcome {
        let mut record = DeploymentRecord::new(self.ctx.network);
        record.args = Some(self.args);
        let mut stage = Stage::Init;

        match self.drive(&mut record, &mut stage).await {
            Ok(()) => DeploymentOutcome {
                stage,
                record,
                error: None,
            },
            Err(error) => {
                tracing::error!(
                    network = %self.ctx.network,
                    last_stage = %stage,
                    error = %error,
                    "Deployment pipeline failed"
                );
                if error.contract_is_live() {
                    if let Some(address) = record.contract_address {
                        tracing::warn!(
                            contract_address = %address,
                            "The deployed contract is live; only verification failed"
                        );
                    }
                }
                DeploymentOutcome {
                    stage: Stage::Failed,
                    record,
                    error: Some(error),
                }
            }
        }
    }

    async fn drive(
        &self,
        record: &mut DeploymentRecord,
        stage: &mut Stage,
    ) -> Result<(), DeployError> {
        self.cancel.check("inspection")?;

        // Inspection is read-only, so transient RPC failures are retried
        // here. Submission below never is.
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(2))
            .with_max_times(self.settings.inspect_attempts.saturating_sub(1));
        let report = (|| async { inspect::inspect(self.signer).await })
            .retry(backoff)
            .when(DeployError::is_transient)
            .notify(|err: &DeployError, delay: Duration| {
                tracing::warn!(
                    error = %err,
                    retry_in_secs = delay.as_secs(),
                    "Account inspection failed, retrying..."
                );
            })
            .await?;
        record.account = Some(report);
        *stage = Stage::Inspected;

        if report.balance < self.settings.min_balance {
            return Err(DeployError::InsufficientFunds {
                address: report.address,
                available: report.balance,
                required: self.settings.min_balance,
            });
        }

        self.cancel.check("submission")?;
        let pending = submit::submit(self.signer, self.artifact, &self.args).await?;
        record.tx_hash = Some(pending.tx_hash);
        *stage = Stage::Submitted;

        let confirmed = confirm::await_confirmation(
            self.signer,
            &pending,
            self.settings.confirm_timeout,
            self.settings.confirm_poll_interval,
        )
        .await?;
        record.contract_address = Some(confirmed.address);
        *stage = Stage::Confirmed;

        let Some(api) = self.verifier else {
            tracing::info!(
                network = %self.ctx.network,
                "No verification service for this network, skipping verification"
            );
            return Ok(());
        };
        self.cancel.check("verification")?;

        let request = VerificationRequest::new(
            &confirmed,
            &self.artifact.contract_name,
            &self.args,
            &self.settings.compiler,
        );
        let outcome = verify::register(api, &request, &self.settings.verify).await?;
        record.verification = Some(outcome);
        *stage = Stage::Verified;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_starts_clear() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        assert!(flag.check("submission").is_ok());
    }

    #[test]
    fn test_cancel_flag_is_shared_across_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        other.cancel();

        assert!(flag.is_cancelled());
        let err = flag.check("submission").unwrap_err();
        assert!(matches!(
            err,
            DeployError::Cancelled {
                stage: "submission"
            }
        ));
    }

    #[test]
    fn test_stage_names_render_kebab_case() {
        assert_eq!(Stage::Init.to_string(), "init");
        assert_eq!(Stage::Verified.to_string(), "verified");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }

    #[test]
    fn test_default_settings_floor_is_a_hundredth_of_native() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.min_balance, U256::from(10_000_000_000_000_000u64));
        assert_eq!(settings.inspect_attempts, 3);
    }

    #[test]
    fn test_failed_early_outcome_has_empty_record() {
        let outcome = DeploymentOutcome::failed_early(
            Network::Sepolia,
            DeployError::Configuration("no such network".into()),
        );
        assert_eq!(outcome.stage, Stage::Failed);
        assert!(!outcome.succeeded());
        assert!(outcome.record.tx_hash.is_none());
        assert!(outcome.record.contract_address.is_none());
    }
}
