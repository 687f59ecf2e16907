//! Deployment records written after a successful deployment.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{request::DeploymentRequest, traits::DeployedContract};

/// What was deployed, where and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract: String,
    pub network: String,
    pub chain_id: u64,
    pub address: Address,
    pub transaction_hash: B256,
    pub deployer: Address,
    pub block_number: u64,
    pub gas_used: u64,
    pub constructor_args: Vec<String>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn new(network: &str, request: &DeploymentRequest, deployed: &DeployedContract) -> Self {
        Self {
            contract: request.contract.clone(),
            network: network.to_string(),
            chain_id: deployed.chain_id,
            address: deployed.address,
            transaction_hash: deployed.transaction_hash,
            deployer: deployed.deployer,
            block_number: deployed.block_number,
            gas_used: deployed.gas_used,
            constructor_args: request.constructor_args.clone(),
            deployed_at: Utc::now(),
        }
    }

    /// `<dir>/<network>/<contract name>.json`
    pub fn path(&self, dir: &Path) -> PathBuf {
        let name = self
            .contract
            .rsplit_once(':')
            .map(|(_, name)| name)
            .unwrap_or(&self.contract);
        dir.join(&self.network).join(format!("{name}.json"))
    }

    /// Create the directory records of `network` are written to.
    ///
    /// Run before deploying so an unwritable records directory fails the run
    /// before anything is broadcast.
    pub fn prepare_dir(dir: &Path, network: &str) -> Result<PathBuf> {
        let network_dir = dir.join(network);
        std::fs::create_dir_all(&network_dir).with_context(|| {
            format!(
                "Failed to create records directory {}",
                network_dir.display()
            )
        })?;
        Ok(network_dir)
    }

    /// Write the record below `dir`, replacing a previous record of the same contract and network.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.path(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create records directory {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize deployment record")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write deployment record {}", path.display()))?;

        tracing::info!(path = %path.display(), "Deployment record saved");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment record {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment record {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn deployed() -> DeployedContract {
        DeployedContract {
            address: Address::repeat_byte(0xab),
            transaction_hash: B256::repeat_byte(0x11),
            deployer: Address::repeat_byte(0x01),
            block_number: 7,
            gas_used: 1_234_567,
            chain_id: 5,
        }
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new("cashflow-records").unwrap();
        let request = DeploymentRequest::stable_cash_flow();
        let record = DeploymentRecord::new("goerli", &request, &deployed());

        let path = record.save(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("goerli").join("StableCashFlow.json"));

        let loaded = DeploymentRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.constructor_args, request.constructor_args);
    }

    #[test]
    fn test_prepare_dir() {
        let tmp = TempDir::new("cashflow-records").unwrap();

        let dir = DeploymentRecord::prepare_dir(tmp.path(), "goerli").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, tmp.path().join("goerli"));

        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        let err = DeploymentRecord::prepare_dir(&file, "goerli").unwrap_err();
        assert!(err.to_string().contains("Failed to create records directory"));
    }

    #[test]
    fn test_path_of_fully_qualified_contract() {
        let request = DeploymentRequest::new(
            "contracts/StableCashFlow.sol:StableCashFlow",
            Vec::<String>::new(),
        );
        let record = DeploymentRecord::new("localhost", &request, &deployed());

        assert_eq!(
            record.path(Path::new("deployments")),
            Path::new("deployments/localhost/StableCashFlow.json")
        );
    }

    #[test]
    fn test_json_field_names() {
        let record = DeploymentRecord::new(
            "localhost",
            &DeploymentRequest::stable_cash_flow(),
            &deployed(),
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["chainId"], 5);
        assert_eq!(json["blockNumber"], 7);
        assert!(json["transactionHash"].is_string());
        assert!(json["deployedAt"].is_string());
    }
}
