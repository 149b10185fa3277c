//! Source-verification registration.
//!
//! After a deployment confirms, the contract address and its constructor
//! arguments are registered with the network's verification service so the
//! public explorer can display matched source. The service's indexer lags
//! the chain, so registration waits out a cool-down first and retries
//! indexing-lag rejections with bounded backoff.

use std::time::Duration;

use alloy_primitives::Address;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{artifact::ConstructorArgs, confirm::ConfirmedDeployment, error::DeployError};

/// HTTP timeout for verification requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Compiler settings reported to the verification service. The defaults
/// pin the build the deployment artifacts are produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub version: String,
    pub optimizer_runs: u32,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            version: "v0.8.18+commit.87f61d96".to_string(),
            optimizer_runs: 100_000,
        }
    }
}

/// What gets submitted to the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub contract_address: Address,
    pub contract_name: String,
    /// ABI-encoded constructor arguments, hex without the `0x` prefix.
    pub constructor_args_hex: String,
    pub compiler_version: String,
    pub optimizer_runs: u32,
}

impl VerificationRequest {
    pub fn new(
        confirmed: &ConfirmedDeployment,
        contract_name: &str,
        args: &ConstructorArgs,
        compiler: &CompilerSettings,
    ) -> Self {
        Self {
            contract_address: confirmed.address,
            contract_name: contract_name.to_string(),
            constructor_args_hex: args.encoded_hex(),
            compiler_version: compiler.version.clone(),
            optimizer_runs: compiler.optimizer_runs,
        }
    }
}

/// Outcome of a successful verification submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The service accepted the request and returned a tracking id.
    Accepted { receipt_id: String },
    /// The service already holds verified source for this address.
    AlreadyVerified,
}

/// A source-verification service accepting deployed-contract registrations.
#[allow(async_fn_in_trait)]
pub trait VerificationApi {
    async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, DeployError>;
}

/// Cool-down and retry schedule for the registrar.
#[derive(Debug, Clone)]
pub struct VerifyPolicy {
    /// Wait before the first attempt, giving the service's indexer time to
    /// observe the new contract. Submitting immediately after confirmation
    /// is known to fail at most services.
    pub cooldown: Duration,
    /// Total attempts, the first one included.
    pub max_attempts: usize,
    /// Delay before the second attempt; doubles on each retry after that.
    pub initial_retry_delay: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            max_attempts: 4,
            initial_retry_delay: Duration::from_secs(10),
        }
    }
}

/// Register a confirmed deployment with the verification service.
///
/// Waits out the cool-down, then submits with bounded exponential backoff.
/// Only transport errors and indexing-lag rejections are retried. Whatever
/// happens here, the deployed contract stays live.
pub async fn register<V: VerificationApi>(
    api: &V,
    request: &VerificationRequest,
    policy: &VerifyPolicy,
) -> Result<VerificationOutcome, DeployError> {
    tracing::info!(
        contract_address = %request.contract_address,
        cooldown_secs = policy.cooldown.as_secs(),
        "Waiting for the verification service to index the contract..."
    );
    tokio::time::sleep(policy.cooldown).await;

    tracing::info!(contract_address = %request.contract_address, "Verifying contract...");

    let backoff = ExponentialBuilder::default()
        .with_min_delay(policy.initial_retry_delay)
        .with_max_times(policy.max_attempts.saturating_sub(1));

    let outcome = (|| async { api.submit(request).await })
        .retry(backoff)
        .when(retryable)
        .notify(|err: &DeployError, delay: Duration| {
            tracing::warn!(
                error = %err,
                retry_in_secs = delay.as_secs(),
                "Verification attempt failed, retrying..."
            );
        })
        .await?;

    match &outcome {
        VerificationOutcome::Accepted { receipt_id } => {
            tracing::info!(receipt_id = %receipt_id, "Contract verification submitted");
        }
        VerificationOutcome::AlreadyVerified => {
            tracing::info!("Contract source already verified");
        }
    }
    Ok(outcome)
}

/// Whether a verification error is worth another attempt.
fn retryable(err: &DeployError) -> bool {
    match err {
        DeployError::NetworkUnavailable(_) => true,
        DeployError::VerificationFailed { reason, .. } => is_indexing_lag(reason),
        _ => false,
    }
}

/// Rejections that mean "not indexed yet" rather than "wrong submission".
fn is_indexing_lag(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("unable to locate contract")
        || reason.contains("pending in queue")
        || reason.contains("does not exist")
}

/// Etherscan-family verification client (Etherscan, Polygonscan).
#[derive(Debug)]
pub struct EtherscanClient {
    http: reqwest::Client,
    api_url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    message: String,
    result: String,
}

impl EtherscanClient {
    pub fn new(api_url: &str, api_key: String) -> Result<Self, DeployError> {
        let api_url = Url::parse(api_url).map_err(|e| {
            DeployError::Configuration(format!("invalid verification API URL '{api_url}': {e}"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                DeployError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            http,
            api_url,
            api_key,
        })
    }

    fn interpret(contract_address: Address, body: ApiResponse) -> Result<VerificationOutcome, DeployError> {
        if body.status == "1" {
            return Ok(VerificationOutcome::Accepted {
                receipt_id: body.result,
            });
        }
        if body.result.to_ascii_lowercase().contains("already verified") {
            return Ok(VerificationOutcome::AlreadyVerified);
        }
        Err(DeployError::VerificationFailed {
            address: contract_address,
            reason: format!("{}: {}", body.message, body.result),
        })
    }
}

impl VerificationApi for EtherscanClient {
    async fn submit(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, DeployError> {
        let contract_address = request.contract_address.to_string();
        let runs = request.optimizer_runs.to_string();
        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", contract_address.as_str()),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", request.compiler_version.as_str()),
            ("optimizationUsed", "1"),
            ("runs", runs.as_str()),
            // Field name misspelling is the API's.
            ("constructorArguements", request.constructor_args_hex.as_str()),
        ];

        let response = self
            .http
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                DeployError::NetworkUnavailable(format!("verification request failed: {e}"))
            })?;
        let body: ApiResponse = response.json().await.map_err(|e| {
            DeployError::NetworkUnavailable(format!("malformed verification response: {e}"))
        })?;

        Self::interpret(request.contract_address, body)
    }
}
