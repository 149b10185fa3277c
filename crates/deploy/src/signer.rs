//! The signing capability consumed by the pipeline stages.

use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;

use crate::{error::DeployError, network::NetworkContext};

/// A broadcast deployment transaction that has not been mined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeployment {
    pub tx_hash: B256,
}

/// One receipt poll for a deployment transaction.
#[derive(Debug, Clone, Copy)]
pub struct DeploymentReceipt {
    /// Whether the transaction executed successfully.
    pub status: bool,
    /// Address of the created contract, when the node reports one.
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
}

/// Signing capability owned by the caller of the pipeline.
///
/// The pipeline treats this as opaque: it can report its address and funds,
/// broadcast a contract-creation transaction, and look up the resulting
/// receipt. Wallet and RPC internals live behind the implementation.
#[allow(async_fn_in_trait)]
pub trait Signer {
    /// The signing account's address.
    fn address(&self) -> Address;

    /// Native-token balance of the signing account, in wei.
    async fn balance(&self) -> Result<U256, DeployError>;

    /// Current network gas price, in wei.
    async fn gas_price(&self) -> Result<u128, DeployError>;

    /// Sign and broadcast a contract-creation transaction carrying
    /// `deploy_code`, returning as soon as the node accepts the broadcast.
    /// Mining is observed separately via [`Signer::deployment_receipt`].
    ///
    /// Not idempotent: every call that reaches the network deploys a fresh
    /// contract instance and spends gas.
    async fn submit_deployment(&self, deploy_code: Bytes)
    -> Result<PendingDeployment, DeployError>;

    /// Look up the receipt for a previously broadcast deployment.
    /// `Ok(None)` means the transaction is not mined yet.
    async fn deployment_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<DeploymentReceipt>, DeployError>;
}

/// Production signer backed by an alloy HTTP provider with a local wallet.
///
/// The wallet filler signs every transaction locally; the node only ever
/// sees raw signed payloads.
pub struct RpcSigner {
    provider: DynProvider,
    address: Address,
    gas_price_hint: Option<u128>,
}

impl RpcSigner {
    /// Connect a signing key to the network's RPC endpoint.
    pub fn connect(ctx: &NetworkContext, key: PrivateKeySigner) -> Self {
        let address = key.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(key))
            .connect_http(ctx.rpc_url.clone())
            .erased();
        Self {
            provider,
            address,
            gas_price_hint: ctx.gas_price_hint,
        }
    }
}

fn rpc_err(err: impl std::fmt::Display) -> DeployError {
    DeployError::NetworkUnavailable(err.to_string())
}

impl Signer for RpcSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance(&self) -> Result<U256, DeployError> {
        self.provider
            .get_balance(self.address)
            .await
            .map_err(rpc_err)
    }

    async fn gas_price(&self) -> Result<u128, DeployError> {
        self.provider.get_gas_price().await.map_err(rpc_err)
    }

    async fn submit_deployment(
        &self,
        deploy_code: Bytes,
    ) -> Result<PendingDeployment, DeployError> {
        let mut tx = TransactionRequest::default().with_deploy_code(deploy_code);
        if let Some(gas_price) = self.gas_price_hint {
            tx = tx.with_gas_price(gas_price);
        }
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(rpc_err)?;
        Ok(PendingDeployment {
            tx_hash: *pending.tx_hash(),
        })
    }

    async fn deployment_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<DeploymentReceipt>, DeployError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_err)?;
        Ok(receipt.map(|r| DeploymentReceipt {
            status: r.status(),
            contract_address: r.contract_address,
            block_number: r.block_number,
        }))
    }
}
