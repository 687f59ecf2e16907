//! cashflow-deploy - Deployment library for the cash flow contract.
//!
//! This crate resolves compiled contract artifacts, encodes constructor arguments,
//! broadcasts the creation transaction over JSON-RPC and waits for the contract
//! to be published on chain.

mod artifacts;
pub use artifacts::{Artifact, ArtifactStore};

mod config;
pub use config::{CONFIG_FILENAME, DEFAULT_NETWORK, DeployConfig, ENV_PREFIX, NetworkConfig};

mod deployer;
pub use deployer::deploy;

mod environment;
pub use environment::RpcEnvironment;

mod factory;
pub use factory::ContractFactory;

pub mod flow;

mod record;
pub use record::DeploymentRecord;

mod request;
pub use request::{
    AGREEMENT_ADDRESS, DeploymentRequest, HOST_ADDRESS, STABLE_CASH_FLOW, TOKEN_A_ADDRESS,
    TOKEN_B_ADDRESS,
};

pub mod rpc;

mod signer;
pub use signer::{CreationTx, Fees, TxSender};

mod traits;
pub use traits::{DeployEnvironment, DeployedContract, PendingDeployment};
