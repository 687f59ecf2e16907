//! JSON-RPC backed deployment environment.

use std::time::Duration;

use alloy_core::primitives::{Address, Bytes};
use anyhow::{Context, Result};
use url::Url;

use crate::{
    artifacts::ArtifactStore,
    config::NetworkConfig,
    factory::ContractFactory,
    rpc::{self, RpcClient, TransactionReceipt},
    signer::{CreationTx, Fees, TxSender},
    traits::{DeployEnvironment, DeployedContract, PendingDeployment},
};

/// Deploys contracts from compiled artifacts to a JSON-RPC endpoint.
#[derive(Debug)]
pub struct RpcEnvironment {
    rpc: RpcClient,
    artifacts: ArtifactStore,
    sender: TxSender,
    chain_id: u64,
    gas_limit: Option<u64>,
    confirmations: u64,
    timeout: Duration,
    poll_interval: Duration,
}

impl RpcEnvironment {
    /// Connect to the network and resolve the deploying account.
    ///
    /// Fails if the endpoint is unreachable, if it reports a chain ID other than the configured one,
    /// or if there is neither a configured private key nor an account managed by the node.
    pub async fn connect(network: &NetworkConfig, artifacts: ArtifactStore) -> Result<Self> {
        let url = Url::parse(&network.url)
            .with_context(|| format!("Invalid RPC URL: {}", network.url))?;
        let rpc = RpcClient::new(url.as_str(), network.request_timeout())?;

        let chain_id = rpc
            .chain_id()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if let Some(expected) = network.chain_id {
            if expected != chain_id {
                anyhow::bail!(
                    "Chain ID mismatch: the network is configured with chain ID {} but {} reports {}",
                    expected,
                    url,
                    chain_id
                );
            }
        }

        let sender = match &network.private_key {
            Some(private_key) => TxSender::from_private_key(private_key)?,
            None => {
                let accounts = rpc
                    .accounts()
                    .await
                    .context("Failed to fetch node accounts")?;
                let account = accounts.first().copied().context(
                    "The node manages no account, configure a private key to sign the deployment",
                )?;
                TxSender::Node(account)
            }
        };

        tracing::info!(
            url = %url,
            chain_id,
            deployer = %sender.address(),
            sender = sender.kind(),
            "Connected to network"
        );

        Ok(Self {
            rpc,
            artifacts,
            sender,
            chain_id,
            gas_limit: network.gas_limit,
            confirmations: network.confirmations.max(1),
            timeout: network.timeout(),
            poll_interval: network.poll_interval(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sender(&self) -> &TxSender {
        &self.sender
    }

    async fn fees(&self) -> Result<Fees> {
        let block = self
            .rpc
            .latest_block()
            .await
            .context("Failed to fetch the latest block")?;

        match block.base_fee_per_gas {
            Some(base_fee) => {
                let priority_fee = self
                    .rpc
                    .max_priority_fee_per_gas()
                    .await
                    .context("Failed to fetch the priority fee")?;
                Ok(Fees::eip1559(base_fee, priority_fee))
            }
            None => {
                let gas_price = self
                    .rpc
                    .gas_price()
                    .await
                    .context("Failed to fetch the gas price")?;
                Ok(Fees::Legacy { gas_price })
            }
        }
    }

    async fn gas_limit(&self, data: &Bytes) -> Result<u64> {
        match self.gas_limit {
            Some(gas_limit) => Ok(gas_limit),
            None => self
                .rpc
                .estimate_gas(self.sender.address(), data)
                .await
                .context("Failed to estimate deployment gas"),
        }
    }

    async fn wait_for_receipt(&self, pending: &PendingDeployment) -> Result<TransactionReceipt> {
        let hash = pending.transaction_hash;

        rpc::wait_until_ready(
            "deployment transaction receipt",
            self.timeout,
            self.poll_interval,
            || self.rpc.transaction_receipt(hash),
        )
        .await
    }

    async fn wait_for_confirmations(&self, receipt: &TransactionReceipt) -> Result<()> {
        if self.confirmations <= 1 {
            return Ok(());
        }

        let target = receipt
            .block_number
            .checked_add(self.confirmations - 1)
            .with_context(|| {
                format!(
                    "{} confirmations after block {} overflow the block number",
                    self.confirmations, receipt.block_number
                )
            })?;
        tracing::info!(
            block_number = receipt.block_number,
            confirmations = self.confirmations,
            "Waiting for confirmations..."
        );

        rpc::wait_until_ready(
            "deployment confirmations",
            self.timeout,
            self.poll_interval,
            || async move {
                let current = self.rpc.block_number().await?;
                Ok((current >= target).then_some(()))
            },
        )
        .await
    }
}

impl DeployEnvironment for RpcEnvironment {
    type Factory = ContractFactory;

    fn contract_factory(&self, name: &str) -> Result<ContractFactory> {
        let artifact = self.artifacts.find(name)?;
        tracing::debug!(
            contract = %artifact.fully_qualified_name(),
            "Resolved contract artifact"
        );
        ContractFactory::new(artifact)
    }

    async fn deploy(
        &self,
        factory: &ContractFactory,
        constructor_args: &[String],
    ) -> Result<PendingDeployment> {
        let data = factory.deploy_data(constructor_args)?;
        let deployer = self.sender.address();

        let nonce = self
            .rpc
            .pending_nonce(deployer)
            .await
            .context("Failed to fetch the deployer nonce")?;
        let gas_limit = self.gas_limit(&data).await?;

        let transaction_hash = match &self.sender {
            TxSender::Node(from) => {
                let tx = serde_json::json!({
                    "from": from,
                    "data": data,
                    "gas": format!("0x{:x}", gas_limit),
                    "nonce": format!("0x{:x}", nonce),
                });
                self.rpc
                    .send_transaction(tx)
                    .await
                    .context("Failed to send deployment transaction")?
            }
            TxSender::Local(signer) => {
                let fees = self.fees().await?;
                let raw = CreationTx {
                    chain_id: self.chain_id,
                    nonce,
                    gas_limit,
                    fees,
                    input: data,
                }
                .sign(signer)?;
                tracing::debug!(fees = %fees, "Signed deployment transaction");
                self.rpc
                    .send_raw_transaction(&raw)
                    .await
                    .context("Failed to send deployment transaction")?
            }
        };

        let address = deployer.create(nonce);

        tracing::info!(
            contract = factory.contract_name(),
            tx_hash = %transaction_hash,
            nonce,
            gas_limit,
            expected_address = %address,
            "Deployment transaction sent"
        );

        Ok(PendingDeployment {
            transaction_hash,
            address,
            deployer,
        })
    }

    async fn wait_deployed(&self, pending: PendingDeployment) -> Result<DeployedContract> {
        let receipt = self.wait_for_receipt(&pending).await?;

        if !receipt.succeeded() {
            anyhow::bail!(
                "Deployment transaction {} reverted in block {}",
                receipt.transaction_hash,
                receipt.block_number
            );
        }

        let address: Address = receipt.contract_address.with_context(|| {
            format!(
                "Receipt of {} has no contract address",
                receipt.transaction_hash
            )
        })?;

        if address != pending.address {
            tracing::warn!(
                expected = %pending.address,
                actual = %address,
                "Contract deployed at an unexpected address"
            );
        }

        self.wait_for_confirmations(&receipt).await?;

        let code = self
            .rpc
            .code(address)
            .await
            .context("Failed to fetch the deployed code")?;
        if code.is_empty() {
            anyhow::bail!("Contract deployment failed: no code at {}", address);
        }

        tracing::info!(
            address = %address,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            "Contract deployed"
        );

        Ok(DeployedContract {
            address,
            transaction_hash: receipt.transaction_hash,
            deployer: pending.deployer,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            chain_id: self.chain_id,
        })
    }
}
