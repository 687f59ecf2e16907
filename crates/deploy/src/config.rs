//! Layered configuration: defaults, `Cashflow.toml`, then `CASHFLOW_` environment variables.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::request::DeploymentRequest;

/// The default name for the configuration file.
pub const CONFIG_FILENAME: &str = "Cashflow.toml";

/// Prefix of the environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "CASHFLOW_";

/// The network used when none is selected.
pub const DEFAULT_NETWORK: &str = "localhost";

/// The JSON-RPC endpoint of a local development node.
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

/// Connection and transaction settings for one network.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// The JSON-RPC endpoint.
    pub url: String,
    /// Expected chain ID. The deployment is refused if the endpoint reports another one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Hex encoded private key of the deployer. Without one, the first node account is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Fixed gas limit for the creation transaction. Estimated when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Number of blocks, including the inclusion block, before the deployment is confirmed.
    pub confirmations: u64,
    /// Maximum time to wait for the confirmation.
    pub timeout_secs: u64,
    /// Time between two receipt polls.
    pub poll_interval_ms: u64,
    /// Timeout of a single JSON-RPC request.
    pub request_timeout_secs: u64,
}

impl NetworkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            url: LOCALHOST_RPC_URL.to_string(),
            chain_id: None,
            private_key: None,
            gas_limit: None,
            confirmations: 1,
            timeout_secs: 300,
            poll_interval_ms: 2000,
            request_timeout_secs: 30,
        }
    }
}

// Keeps the private key out of logs.
impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("url", &self.url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("gas_limit", &self.gas_limit)
            .field("confirmations", &self.confirmations)
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Complete configuration of a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Name of the network to deploy to, a key of `networks`.
    pub network: String,
    /// Root of the compiled contract artifacts.
    pub artifacts: PathBuf,
    /// The contract and its constructor arguments.
    pub deployment: DeploymentRequest,
    /// Directory where deployment records are written. No record is written when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_dir: Option<PathBuf>,
    /// Known networks by name.
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            artifacts: PathBuf::from("artifacts"),
            deployment: DeploymentRequest::default(),
            record_dir: None,
            networks: BTreeMap::from([(DEFAULT_NETWORK.to_string(), NetworkConfig::default())]),
        }
    }
}

impl DeployConfig {
    /// Load the configuration.
    ///
    /// Layers, from lowest to highest priority:
    /// 1. built-in defaults,
    /// 2. the TOML file at `path`, or `Cashflow.toml` in the working directory if it exists,
    /// 3. `CASHFLOW_` environment variables, nested keys separated by `__`
    ///    (e.g. `CASHFLOW_NETWORKS__GOERLI__PRIVATE_KEY`).
    ///
    /// An explicitly provided `path` that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                let config_path = if path.is_dir() {
                    path.join(CONFIG_FILENAME)
                } else {
                    path.to_path_buf()
                };
                if !config_path.is_file() {
                    anyhow::bail!("Configuration file not found: {}", config_path.display());
                }
                figment = figment.merge(Toml::file(&config_path));
                tracing::debug!(path = %config_path.display(), "Configuration file loaded");
            }
            None if Path::new(CONFIG_FILENAME).is_file() => {
                figment = figment.merge(Toml::file(CONFIG_FILENAME));
                tracing::debug!(path = CONFIG_FILENAME, "Configuration file loaded");
            }
            None => {}
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract the configuration from a figment.
    pub fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .context("Failed to parse deployment configuration")
    }

    /// The configuration of the selected network.
    pub fn network_config(&self) -> Result<&NetworkConfig> {
        self.networks.get(&self.network).with_context(|| {
            let known: Vec<&str> = self.networks.keys().map(String::as_str).collect();
            format!(
                "Unknown network \"{}\", configured networks: {}",
                self.network,
                known.join(", ")
            )
        })
    }

    /// Mutable configuration of the selected network, created with defaults if missing.
    pub fn network_config_mut(&mut self) -> &mut NetworkConfig {
        self.networks.entry(self.network.clone()).or_default()
    }

    /// The configuration without private keys, safe to write to disk.
    pub fn without_secrets(mut self) -> Self {
        for network in self.networks.values_mut() {
            network.private_key = None;
        }
        self
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }
}
