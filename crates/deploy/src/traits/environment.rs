//! Core environment trait for contract deployment.

use std::future::Future;

use alloy_core::primitives::{Address, B256};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A broadcast deployment transaction that may not be mined yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    /// Hash of the creation transaction.
    pub transaction_hash: B256,
    /// Address the contract is expected at, derived from the sender and its nonce.
    pub address: Address,
    /// Account that sent the creation transaction.
    pub deployer: Address,
}

/// A confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: B256,
    pub deployer: Address,
    pub block_number: u64,
    pub gas_used: u64,
    pub chain_id: u64,
}

/// Everything a deployment needs from the outside world.
///
/// An environment resolves compiled contracts, broadcasts creation transactions and
/// awaits their confirmation. The RPC-backed implementation is
/// [`RpcEnvironment`](crate::RpcEnvironment).
///
/// # Type Parameters
/// - `Factory`: Handle able to deploy instances of one compiled contract
pub trait DeployEnvironment: Send + Sync {
    /// The factory type returned by contract lookups.
    type Factory: Send + Sync;

    /// Resolve the factory of a contract by name.
    fn contract_factory(&self, name: &str) -> Result<Self::Factory>;

    /// Broadcast a creation transaction with the given constructor arguments.
    ///
    /// Every call sends a new transaction, so calling this twice creates two contracts.
    fn deploy(
        &self,
        factory: &Self::Factory,
        constructor_args: &[String],
    ) -> impl Future<Output = Result<PendingDeployment>> + Send;

    /// Wait until the contract code is published on chain.
    fn wait_deployed(
        &self,
        pending: PendingDeployment,
    ) -> impl Future<Output = Result<DeployedContract>> + Send;
}
