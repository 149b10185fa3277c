//! Pre-deployment account introspection.

use alloy_primitives::{
    Address, U256,
    utils::{format_ether, format_units},
};

use crate::{error::DeployError, signer::Signer};

/// Snapshot of the signing account and the network fee market, taken
/// before any funds are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountReport {
    pub address: Address,
    /// Native-token balance, in wei.
    pub balance: U256,
    /// Current network gas price, in wei.
    pub gas_price: u128,
}

impl AccountReport {
    /// Balance rendered in whole native-token units.
    pub fn balance_native(&self) -> String {
        format_ether(self.balance)
    }

    /// Gas price rendered in gwei.
    pub fn gas_price_gwei(&self) -> String {
        format_units(U256::from(self.gas_price), "gwei")
            .unwrap_or_else(|_| self.gas_price.to_string())
    }
}

/// Read the signer's address, balance and the current gas price.
///
/// Two read-only RPC calls. Transient failures surface as
/// [`DeployError::NetworkUnavailable`]; retry policy is left to the caller.
pub async fn inspect<S: Signer>(signer: &S) -> Result<AccountReport, DeployError> {
    let address = signer.address();
    let balance = signer.balance().await?;
    let gas_price = signer.gas_price().await?;

    let report = AccountReport {
        address,
        balance,
        gas_price,
    };
    tracing::info!(
        account = %report.address,
        balance = %report.balance_native(),
        gas_price_gwei = %report.gas_price_gwei(),
        "Deployer account inspected"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, address};

    use crate::signer::{DeploymentReceipt, PendingDeployment};

    struct FixedSigner {
        balance: Result<U256, DeployError>,
        gas_price: Result<u128, DeployError>,
    }

    impl Signer for FixedSigner {
        fn address(&self) -> Address {
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        }

        async fn balance(&self) -> Result<U256, DeployError> {
            self.balance.clone()
        }

        async fn gas_price(&self) -> Result<u128, DeployError> {
            self.gas_price.clone()
        }

        async fn submit_deployment(
            &self,
            _deploy_code: Bytes,
        ) -> Result<PendingDeployment, DeployError> {
            unimplemented!("inspection never submits")
        }

        async fn deployment_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<DeploymentReceipt>, DeployError> {
            unimplemented!("inspection never polls receipts")
        }
    }

    #[tokio::test]
    async fn test_inspect_reports_account_state() {
        let signer = FixedSigner {
            balance: Ok(U256::from(10u128.pow(19))),
            gas_price: Ok(75_000_000_000),
        };
        let report = inspect(&signer).await.unwrap();
        assert_eq!(report.address, signer.address());
        assert_eq!(report.balance, U256::from(10u128.pow(19)));
        assert_eq!(report.gas_price, 75_000_000_000);
    }

    #[tokio::test]
    async fn test_inspect_surfaces_rpc_failures_untouched() {
        let signer = FixedSigner {
            balance: Err(DeployError::NetworkUnavailable("connection refused".into())),
            gas_price: Ok(0),
        };
        let err = inspect(&signer).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_balance_formatting() {
        let report = AccountReport {
            address: Address::ZERO,
            balance: U256::from(10u128.pow(19)),
            gas_price: 0,
        };
        assert_eq!(report.balance_native(), "10.000000000000000000");
    }

    #[test]
    fn test_gas_price_formatting() {
        let report = AccountReport {
            address: Address::ZERO,
            balance: U256::ZERO,
            gas_price: 75_000_000_000,
        };
        assert_eq!(report.gas_price_gwei(), "75.000000000");
    }
}
