//! Target network table and context resolution.
//!
//! Everything here is pure configuration: resolving the same network with
//! the same credentials always yields the same context, and nothing touches
//! the wire.

use alloy_primitives::{Address, address};
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DeployError;

/// Environment variable holding the deployer's signing key.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";
/// Environment variable holding the Infura project key.
pub const INFURA_API_KEY_ENV: &str = "INFURA_API_KEY";
/// Environment variable holding the Etherscan API key.
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
/// Environment variable holding the Polygonscan API key.
pub const POLYGONSCAN_API_KEY_ENV: &str = "POLYGONSCAN_API_KEY";

/// Messaging endpoint on the Ethereum side.
const ETHEREUM_REMOTE_ENDPOINT: Address = address!("0x66A71Dcef29A0fFBDBE3c6a460a3B5BC225Cd675");
/// Messaging endpoint on the Polygon side.
const POLYGON_REMOTE_ENDPOINT: Address = address!("0x3c2269811836af69497E5F486A85D7316753cf62");

/// The networks this tool knows how to deploy to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Local,
    Mainnet,
    Goerli,
    Sepolia,
    Polygon,
    PolygonMumbai,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Local => 31337,
            Network::Mainnet => 1,
            Network::Goerli => 5,
            Network::Sepolia => 11155111,
            Network::Polygon => 137,
            Network::PolygonMumbai => 80001,
        }
    }

    /// Fixed gas price used for broadcasts on this network, in wei.
    ///
    /// Networks without a hint let the node quote the fee.
    pub fn gas_price_hint(&self) -> Option<u128> {
        match self {
            Network::Local => None,
            Network::Mainnet | Network::Goerli | Network::Sepolia => Some(75_000_000_000),
            Network::Polygon | Network::PolygonMumbai => Some(8_000_000_000),
        }
    }

    /// Messaging endpoint the token's constructor is wired to on this
    /// network, when one is known.
    pub fn default_remote_endpoint(&self) -> Option<Address> {
        match self {
            Network::Local => None,
            Network::Mainnet | Network::Goerli | Network::Sepolia => Some(ETHEREUM_REMOTE_ENDPOINT),
            Network::Polygon | Network::PolygonMumbai => Some(POLYGON_REMOTE_ENDPOINT),
        }
    }

    /// Source-verification API endpoint and the env var carrying its key.
    /// `None` for networks without a public explorer.
    pub fn verifier_api(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Network::Local => None,
            Network::Mainnet => Some(("https://api.etherscan.io/api", ETHERSCAN_API_KEY_ENV)),
            Network::Goerli => Some((
                "https://api-goerli.etherscan.io/api",
                ETHERSCAN_API_KEY_ENV,
            )),
            Network::Sepolia => Some((
                "https://api-sepolia.etherscan.io/api",
                ETHERSCAN_API_KEY_ENV,
            )),
            Network::Polygon => Some(("https://api.polygonscan.com/api", POLYGONSCAN_API_KEY_ENV)),
            Network::PolygonMumbai => Some((
                "https://api-testnet.polygonscan.com/api",
                POLYGONSCAN_API_KEY_ENV,
            )),
        }
    }

    fn infura_url(&self, subdomain: &str, credentials: &Credentials) -> Result<String, DeployError> {
        let key = credentials.infura_api_key.as_deref().ok_or_else(|| {
            DeployError::Configuration(format!(
                "{INFURA_API_KEY_ENV} is not set; required for network '{self}' \
                 (or set an explicit rpc_url for the target)"
            ))
        })?;
        Ok(format!("https://{subdomain}.infura.io/v3/{key}"))
    }

    /// Default RPC endpoint for the network.
    fn rpc_url(&self, credentials: &Credentials) -> Result<Url, DeployError> {
        let raw = match self {
            Network::Local => "http://127.0.0.1:8545".to_string(),
            Network::Polygon => "https://polygon-rpc.com/".to_string(),
            Network::PolygonMumbai => "https://rpc-mumbai.maticvigil.com".to_string(),
            Network::Mainnet => self.infura_url("mainnet", credentials)?,
            Network::Goerli => self.infura_url("goerli", credentials)?,
            Network::Sepolia => self.infura_url("sepolia", credentials)?,
        };
        Url::parse(&raw)
            .map_err(|e| DeployError::Configuration(format!("invalid RPC URL '{raw}': {e}")))
    }
}

/// Snapshot of the credential environment.
///
/// Taken once at startup so resolution stays deterministic for the whole
/// run regardless of environment changes underneath.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub private_key: Option<String>,
    pub infura_api_key: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub polygonscan_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        fn read(var: &str) -> Option<String> {
            std::env::var(var).ok().filter(|v| !v.is_empty())
        }
        Self {
            private_key: read(PRIVATE_KEY_ENV),
            infura_api_key: read(INFURA_API_KEY_ENV),
            etherscan_api_key: read(ETHERSCAN_API_KEY_ENV),
            polygonscan_api_key: read(POLYGONSCAN_API_KEY_ENV),
        }
    }

    /// Signing keys available to a pipeline. Empty when no key is
    /// configured; a malformed key is a configuration error.
    pub fn signers(&self) -> Result<Vec<PrivateKeySigner>, DeployError> {
        match &self.private_key {
            None => Ok(Vec::new()),
            Some(raw) => {
                let signer = raw.parse::<PrivateKeySigner>().map_err(|e| {
                    DeployError::Configuration(format!("invalid {PRIVATE_KEY_ENV}: {e}"))
                })?;
                Ok(vec![signer])
            }
        }
    }

    /// The signing key a deployment on `network` will use, or
    /// [`DeployError::NoSignerAvailable`] when none is configured.
    pub fn signer(&self, network: Network) -> Result<PrivateKeySigner, DeployError> {
        self.signers()?
            .into_iter()
            .next()
            .ok_or(DeployError::NoSignerAvailable {
                network: network.to_string(),
                env_var: PRIVATE_KEY_ENV,
            })
    }

    /// The verification API key for `network`, if one is configured.
    pub fn verifier_key(&self, network: Network) -> Option<&str> {
        match network.verifier_api()? {
            (_, env) if env == ETHERSCAN_API_KEY_ENV => self.etherscan_api_key.as_deref(),
            _ => self.polygonscan_api_key.as_deref(),
        }
    }
}

/// Resolved context for one target network. Immutable once built; each
/// target gets its own instance.
#[derive(Debug, Clone)]
pub struct NetworkContext {
    pub network: Network,
    pub rpc_url: Url,
    pub chain_id: u64,
    pub gas_price_hint: Option<u128>,
}

impl NetworkContext {
    /// Resolve the context for a named network.
    ///
    /// Pure configuration resolution: no I/O, no retries. An explicit
    /// `rpc_override` replaces the built-in endpoint (and lifts the Infura
    /// key requirement).
    pub fn resolve(
        network: Network,
        credentials: &Credentials,
        rpc_override: Option<&Url>,
    ) -> Result<Self, DeployError> {
        let rpc_url = match rpc_override {
            Some(url) => url.clone(),
            None => network.rpc_url(credentials)?,
        };
        Ok(Self {
            network,
            rpc_url,
            chain_id: network.chain_id(),
            gas_price_hint: network.gas_price_hint(),
        })
    }
}
