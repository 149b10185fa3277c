//! Confirmation wait for a broadcast deployment.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use tokio::time::Instant;

use crate::{
    error::DeployError,
    signer::{PendingDeployment, Signer},
};

/// Default bound on the confirmation wait.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(300);
/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A deployment that has been mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDeployment {
    pub tx_hash: B256,
    pub address: Address,
    pub block_number: Option<u64>,
}

/// Poll until the pending deployment is mined and its contract address is
/// materialized, or until `timeout` elapses.
///
/// Timing out does not mean the transaction is lost -- it may still be
/// sitting in the mempool -- so the timeout gets its own error kind and
/// the message points the operator at the explorer.
pub async fn await_confirmation<S: Signer>(
    signer: &S,
    pending: &PendingDeployment,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ConfirmedDeployment, DeployError> {
    let started = Instant::now();

    loop {
        match signer.deployment_receipt(pending.tx_hash).await {
            Ok(Some(receipt)) => {
                if !receipt.status {
                    return Err(DeployError::Reverted(pending.tx_hash));
                }
                let address = receipt.contract_address.ok_or_else(|| {
                    DeployError::NetworkUnavailable(format!(
                        "receipt for {} carries no contract address",
                        pending.tx_hash
                    ))
                })?;
                tracing::info!(
                    tx_hash = %pending.tx_hash,
                    contract_address = %address,
                    block_number = receipt.block_number,
                    "Contract deployed"
                );
                return Ok(ConfirmedDeployment {
                    tx_hash: pending.tx_hash,
                    address,
                    block_number: receipt.block_number,
                });
            }
            Ok(None) => {
                tracing::trace!(tx_hash = %pending.tx_hash, "Not mined yet, polling...");
            }
            // Keep polling through flaky receipt queries until the deadline;
            // the transaction is already broadcast.
            Err(e) => {
                tracing::trace!(error = %e, "Receipt query failed, retrying...");
            }
        }

        if started.elapsed() >= timeout {
            return Err(DeployError::ConfirmationTimeout {
                tx_hash: pending.tx_hash,
                waited_secs: timeout.as_secs(),
            });
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use alloy_primitives::{Bytes, U256, address, b256};

    use crate::signer::DeploymentReceipt;

    const TX_HASH: B256 =
        b256!("0x2222222222222222222222222222222222222222222222222222222222222222");
    const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    /// Replays a scripted sequence of receipt polls, then keeps returning
    /// the last entry.
    struct ScriptedSigner {
        script: Mutex<VecDeque<Result<Option<DeploymentReceipt>, DeployError>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedSigner {
        fn new(script: Vec<Result<Option<DeploymentReceipt>, DeployError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: Mutex::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    impl Signer for ScriptedSigner {
        fn address(&self) -> Address {
            Address::ZERO
        }

        async fn balance(&self) -> Result<U256, DeployError> {
            Ok(U256::ZERO)
        }

        async fn gas_price(&self) -> Result<u128, DeployError> {
            Ok(0)
        }

        async fn submit_deployment(
            &self,
            _deploy_code: Bytes,
        ) -> Result<PendingDeployment, DeployError> {
            Ok(PendingDeployment { tx_hash: TX_HASH })
        }

        async fn deployment_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<DeploymentReceipt>, DeployError> {
            *self.polls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap_or(Ok(None))
            }
        }
    }

    fn mined() -> Result<Option<DeploymentReceipt>, DeployError> {
        Ok(Some(DeploymentReceipt {
            status: true,
            contract_address: Some(CONTRACT),
            block_number: Some(7),
        }))
    }

    fn pending() -> PendingDeployment {
        PendingDeployment { tx_hash: TX_HASH }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_once_mined() {
        let signer = ScriptedSigner::new(vec![Ok(None), Ok(None), mined()]);
        let confirmed = await_confirmation(
            &signer,
            &pending(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(confirmed.address, CONTRACT);
        assert_eq!(confirmed.tx_hash, TX_HASH);
        assert_eq!(confirmed.block_number, Some(7));
        assert_eq!(signer.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_its_own_error_kind() {
        let signer = ScriptedSigner::new(vec![Ok(None)]);
        let err = await_confirmation(
            &signer,
            &pending(),
            Duration::from_secs(30),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            DeployError::ConfirmationTimeout {
                tx_hash,
                waited_secs,
            } => {
                assert_eq!(tx_hash, TX_HASH);
                assert_eq!(waited_secs, 30);
            }
            other => panic!("expected ConfirmationTimeout, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_deployment_is_not_a_timeout() {
        let signer = ScriptedSigner::new(vec![Ok(Some(DeploymentReceipt {
            status: false,
            contract_address: None,
            block_number: Some(7),
        }))]);
        let err = await_confirmation(
            &signer,
            &pending(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Reverted(hash) if hash == TX_HASH));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_receipt_queries_do_not_abort_the_wait() {
        let signer = ScriptedSigner::new(vec![
            Err(DeployError::NetworkUnavailable("502".into())),
            Err(DeployError::NetworkUnavailable("502".into())),
            mined(),
        ]);
        let confirmed = await_confirmation(
            &signer,
            &pending(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(confirmed.address, CONTRACT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_without_contract_address_is_surfaced() {
        let signer = ScriptedSigner::new(vec![Ok(Some(DeploymentReceipt {
            status: true,
            contract_address: None,
            block_number: Some(7),
        }))]);
        let err = await_confirmation(
            &signer,
            &pending(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("no contract address"));
    }
}
