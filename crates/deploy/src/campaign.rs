//! Multi-network campaign driver.
//!
//! Runs one deployment pipeline per target network, strictly in order.
//! Targets are isolated: each gets its own context, signer and record, and
//! one target's failure never stops the next. The aggregate report decides
//! the process exit status.

use alloy_primitives::Address;
use chrono::{DateTime, Utc};

use crate::{
    artifact::{ConstructorArgs, ContractArtifact},
    config::{CampaignConfig, TargetConfig},
    error::DeployError,
    network::{Credentials, NetworkContext},
    pipeline::{CancelFlag, DeploymentOutcome, Pipeline, PipelineSettings},
    signer::{RpcSigner, Signer},
    verify::EtherscanClient,
};

/// Aggregated result of a campaign run.
#[derive(Debug)]
pub struct CampaignReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<DeploymentOutcome>,
}

impl CampaignReport {
    /// True when every target reached a successful terminal stage.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(DeploymentOutcome::succeeded)
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }
}

/// Run every target in the campaign, in order.
///
/// Campaign-wide problems (an unloadable artifact, an invalid target list)
/// fail the whole run up front; per-target problems are recorded in that
/// target's outcome and the driver moves on.
pub async fn run_campaign(
    config: &CampaignConfig,
    credentials: &Credentials,
    cancel: &CancelFlag,
) -> Result<CampaignReport, DeployError> {
    config.validate()?;
    let artifact = ContractArtifact::load(&config.artifact)?;
    let settings = config.settings()?;

    let started_at = Utc::now();
    let mut outcomes = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        tracing::info!(network = %target.network, "=== Starting token deployment ===");
        let outcome = deploy_target(target, config, &artifact, &settings, credentials, cancel).await;
        outcomes.push(outcome);
    }

    Ok(CampaignReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
    })
}

async fn deploy_target(
    target: &TargetConfig,
    config: &CampaignConfig,
    artifact: &ContractArtifact,
    settings: &PipelineSettings,
    credentials: &Credentials,
    cancel: &CancelFlag,
) -> DeploymentOutcome {
    let prepared = prepare_target(target, config, credentials);
    match prepared {
        Ok((ctx, signer, args, verifier)) => {
            Pipeline {
                ctx: &ctx,
                signer: &signer,
                verifier: verifier.as_ref(),
                artifact,
                args,
                settings,
                cancel: cancel.clone(),
            }
            .run()
            .await
        }
        Err(error) => {
            tracing::error!(
                network = %target.network,
                error = %error,
                "Target could not be prepared"
            );
            DeploymentOutcome::failed_early(target.network, error)
        }
    }
}

type PreparedTarget = (
    NetworkContext,
    RpcSigner,
    ConstructorArgs,
    Option<EtherscanClient>,
);

/// Resolve everything a target's pipeline needs, without touching the
/// network.
fn prepare_target(
    target: &TargetConfig,
    config: &CampaignConfig,
    credentials: &Credentials,
) -> Result<PreparedTarget, DeployError> {
    let ctx = NetworkContext::resolve(target.network, credentials, target.rpc_url.as_ref())?;
    let key = credentials.signer(target.network)?;
    let signer = RpcSigner::connect(&ctx, key);

    let args = resolve_args(target, config, signer.address())?;

    let verifier = if config.verify {
        build_verifier(target, credentials)?
    } else {
        None
    };

    Ok((ctx, signer, args, verifier))
}

/// Constructor arguments for a target: explicit values win, then the
/// campaign default, then the signing account (beneficiary) and the
/// network's known endpoint (remote endpoint).
fn resolve_args(
    target: &TargetConfig,
    config: &CampaignConfig,
    signer_address: Address,
) -> Result<ConstructorArgs, DeployError> {
    let beneficiary = target
        .beneficiary
        .or(config.beneficiary)
        .unwrap_or(signer_address);
    let remote_endpoint = target
        .remote_endpoint
        .or_else(|| target.network.default_remote_endpoint())
        .ok_or_else(|| {
            DeployError::Configuration(format!(
                "no remote messaging endpoint known for '{}'; set remote_endpoint on the target",
                target.network
            ))
        })?;
    Ok(ConstructorArgs {
        beneficiary,
        remote_endpoint,
    })
}

fn build_verifier(
    target: &TargetConfig,
    credentials: &Credentials,
) -> Result<Option<EtherscanClient>, DeployError> {
    let Some((api_url, key_env)) = target.network.verifier_api() else {
        return Ok(None);
    };
    let key = credentials.verifier_key(target.network).ok_or_else(|| {
        DeployError::Configuration(format!(
            "{key_env} is not set; required to verify on '{}' \
             (or disable verification for this run)",
            target.network
        ))
    })?;
    Ok(Some(EtherscanClient::new(api_url, key.to_string())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    use crate::network::Network;

    const SIGNER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const EXPLICIT: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn campaign() -> CampaignConfig {
        CampaignConfig {
            artifact: "artifacts/Stablecomp.json".into(),
            beneficiary: None,
            verify: true,
            min_balance_eth: "0.01".into(),
            confirm_timeout_secs: 300,
            confirm_poll_secs: 5,
            cooldown_secs: 60,
            compiler: Default::default(),
            targets: vec![TargetConfig::new(Network::Polygon)],
        }
    }

    #[test]
    fn test_beneficiary_defaults_to_the_signer() {
        let target = TargetConfig::new(Network::Polygon);
        let args = resolve_args(&target, &campaign(), SIGNER).unwrap();
        assert_eq!(args.beneficiary, SIGNER);
        assert_eq!(
            args.remote_endpoint,
            Network::Polygon.default_remote_endpoint().unwrap()
        );
    }

    #[test]
    fn test_target_beneficiary_wins_over_campaign_default() {
        let mut config = campaign();
        config.beneficiary = Some(EXPLICIT);

        let mut target = TargetConfig::new(Network::Polygon);
        let args = resolve_args(&target, &config, SIGNER).unwrap();
        assert_eq!(args.beneficiary, EXPLICIT);

        target.beneficiary = Some(SIGNER);
        let args = resolve_args(&target, &config, SIGNER).unwrap();
        assert_eq!(args.beneficiary, SIGNER);
    }

    #[test]
    fn test_local_needs_an_explicit_remote_endpoint() {
        let target = TargetConfig::new(Network::Local);
        let err = resolve_args(&target, &campaign(), SIGNER).unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));

        let target = TargetConfig {
            remote_endpoint: Some(EXPLICIT),
            ..TargetConfig::new(Network::Local)
        };
        let args = resolve_args(&target, &campaign(), SIGNER).unwrap();
        assert_eq!(args.remote_endpoint, EXPLICIT);
    }

    #[test]
    fn test_verifier_requires_its_api_key() {
        let target = TargetConfig::new(Network::Polygon);
        let err = build_verifier(&target, &Credentials::default()).unwrap_err();
        assert!(err.to_string().contains("POLYGONSCAN_API_KEY"));

        let credentials = Credentials {
            polygonscan_api_key: Some("poly-key".into()),
            ..Default::default()
        };
        assert!(build_verifier(&target, &credentials).unwrap().is_some());
    }

    #[test]
    fn test_no_verifier_for_local() {
        let target = TargetConfig::new(Network::Local);
        assert!(
            build_verifier(&target, &Credentials::default())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_report_aggregation() {
        let report = CampaignReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                DeploymentOutcome::failed_early(
                    Network::Sepolia,
                    DeployError::NetworkUnavailable("down".into()),
                ),
            ],
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.succeeded_count(), 0);
    }
}
