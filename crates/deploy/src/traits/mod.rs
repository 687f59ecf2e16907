//! Trait seam between the deploy procedure and the network it deploys to.

mod environment;

pub use environment::{DeployEnvironment, DeployedContract, PendingDeployment};
