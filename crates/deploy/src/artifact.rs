//! Compiled contract artifact handling.

use std::path::Path;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use serde::Deserialize;

use crate::error::DeployError;

/// Constructor arguments baked into the creation transaction.
///
/// The token's constructor takes the vesting beneficiary and the remote
/// messaging-endpoint address, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorArgs {
    pub beneficiary: Address,
    pub remote_endpoint: Address,
}

impl ConstructorArgs {
    /// ABI encoding of the arguments, as appended to the creation bytecode.
    pub fn abi_encode(&self) -> Vec<u8> {
        (self.beneficiary, self.remote_endpoint).abi_encode_params()
    }

    /// Hex encoding without the `0x` prefix, as verification services
    /// expect it.
    pub fn encoded_hex(&self) -> String {
        hex::encode(self.abi_encode())
    }
}

#[derive(Deserialize)]
struct RawArtifact {
    #[serde(rename = "contractName")]
    contract_name: String,
    #[serde(default)]
    abi: Vec<AbiEntry>,
    bytecode: String,
}

#[derive(Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    inputs: Vec<AbiInput>,
}

#[derive(Deserialize)]
struct AbiInput {
    #[serde(rename = "type")]
    kind: String,
}

/// A compiled contract as emitted by the build step, in the Hardhat
/// artifact layout (`contractName` / `abi` / `bytecode`).
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub bytecode: Bytes,
    constructor_inputs: Vec<String>,
}

impl ContractArtifact {
    /// Load an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Configuration(format!(
                "failed to read artifact {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse an artifact from its JSON representation.
    pub fn from_json(content: &str) -> Result<Self, DeployError> {
        let raw: RawArtifact = serde_json::from_str(content)
            .map_err(|e| DeployError::Configuration(format!("malformed artifact JSON: {e}")))?;

        let cleaned = raw.bytecode.trim().trim_start_matches("0x");
        if cleaned.is_empty() {
            return Err(DeployError::Configuration(format!(
                "artifact for {} carries no bytecode; was the contract compiled?",
                raw.contract_name
            )));
        }
        let bytecode = hex::decode(cleaned).map_err(|e| {
            DeployError::Configuration(format!("artifact bytecode is not valid hex: {e}"))
        })?;

        let constructor_inputs = raw
            .abi
            .iter()
            .find(|entry| entry.kind == "constructor")
            .map(|entry| entry.inputs.iter().map(|input| input.kind.clone()).collect())
            .unwrap_or_default();

        Ok(Self {
            contract_name: raw.contract_name,
            bytecode: Bytes::from(bytecode),
            constructor_inputs,
        })
    }

    /// Check that the declared constructor matches what this pipeline
    /// deploys with: exactly two `address` parameters.
    pub fn check_constructor(&self) -> Result<(), DeployError> {
        let expected = ["address", "address"];
        if self.constructor_inputs.len() != expected.len()
            || self
                .constructor_inputs
                .iter()
                .zip(expected)
                .any(|(got, want)| got != want)
        {
            return Err(DeployError::Configuration(format!(
                "constructor mismatch for {}: expected (address beneficiary, \
                 address remoteEndpoint), artifact declares ({})",
                self.contract_name,
                self.constructor_inputs.join(", ")
            )));
        }
        Ok(())
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn deploy_code(&self, args: &ConstructorArgs) -> Bytes {
        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&args.abi_encode());
        Bytes::from(code)
    }
}
