//! Contract-creation submission.

use crate::{
    artifact::{ConstructorArgs, ContractArtifact},
    error::DeployError,
    signer::{PendingDeployment, Signer},
};

/// Broadcast the contract-creation transaction.
///
/// The constructor shape is validated before anything touches the network;
/// after that exactly one transaction is broadcast. This is not idempotent:
/// a second call deploys a second contract instance and spends gas again,
/// so callers must never retry it.
pub async fn submit<S: Signer>(
    signer: &S,
    artifact: &ContractArtifact,
    args: &ConstructorArgs,
) -> Result<PendingDeployment, DeployError> {
    artifact.check_constructor()?;

    tracing::info!(
        contract = %artifact.contract_name,
        beneficiary = %args.beneficiary,
        remote_endpoint = %args.remote_endpoint,
        "Deploying contract..."
    );

    let pending = signer.submit_deployment(artifact.deploy_code(args)).await?;

    tracing::info!(tx_hash = %pending.tx_hash, "Deployment transaction broadcast");
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use alloy_primitives::{Address, B256, Bytes, U256, address, b256};

    use crate::signer::DeploymentReceipt;

    const TX_HASH: B256 =
        b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    #[derive(Default)]
    struct RecordingSigner {
        submissions: Mutex<Vec<Bytes>>,
    }

    impl Signer for RecordingSigner {
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
            deploy_code: Bytes,
        ) -> Result<PendingDeployment, DeployError> {
            self.submissions.lock().unwrap().push(deploy_code);
            Ok(PendingDeployment { tx_hash: TX_HASH })
        }

        async fn deployment_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<DeploymentReceipt>, DeployError> {
            Ok(None)
        }
    }

    fn artifact(constructor_inputs: &str) -> ContractArtifact {
        let json = format!(
            r#"{{
                "contractName": "Stablecomp",
                "abi": [ {{ "type": "constructor", "inputs": [{constructor_inputs}] }} ],
                "bytecode": "0x6080604052"
            }}"#
        );
        ContractArtifact::from_json(&json).unwrap()
    }

    fn two_address_constructor() -> ContractArtifact {
        artifact(
            r#"{ "name": "beneficiary", "type": "address" },
               { "name": "endpoint", "type": "address" }"#,
        )
    }

    fn args() -> ConstructorArgs {
        ConstructorArgs {
            beneficiary: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            remote_endpoint: address!("0x66A71Dcef29A0fFBDBE3c6a460a3B5BC225Cd675"),
        }
    }

    #[tokio::test]
    async fn test_submit_broadcasts_exactly_once() {
        let signer = RecordingSigner::default();
        let pending = submit(&signer, &two_address_constructor(), &args())
            .await
            .unwrap();

        assert_eq!(pending.tx_hash, TX_HASH);
        let submissions = signer.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
    }

    #[tokio::test]
    async fn test_submitted_code_is_bytecode_plus_args() {
        let signer = RecordingSigner::default();
        let artifact = two_address_constructor();
        submit(&signer, &artifact, &args()).await.unwrap();

        let submissions = signer.submissions.lock().unwrap();
        assert_eq!(submissions[0], artifact.deploy_code(&args()));
    }

    #[tokio::test]
    async fn test_constructor_mismatch_fails_before_any_broadcast() {
        let signer = RecordingSigner::default();
        let artifact = artifact(r#"{ "name": "owner", "type": "address" }"#);

        let err = submit(&signer, &artifact, &args()).await.unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
        assert!(signer.submissions.lock().unwrap().is_empty());
    }
}
