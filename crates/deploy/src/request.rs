//! The deployment request: which contract to deploy and with which constructor arguments.

use serde::{Deserialize, Serialize};

/// The contract deployed by default.
pub const STABLE_CASH_FLOW: &str = "StableCashFlow";

/// Protocol host address.
pub const HOST_ADDRESS: &str = "0xF2B4E81ba39F5215Db2e05B2F66f482BB8e87FD2";
/// Constant flow agreement address.
pub const AGREEMENT_ADDRESS: &str = "0xaD2F1f7cd663f6a15742675f975CcBD42bb23a88";
/// First token stream address.
pub const TOKEN_A_ADDRESS: &str = "0xBF6201a6c48B56d8577eDD079b84716BB4918E8A";
/// Second token stream address.
pub const TOKEN_B_ADDRESS: &str = "0x2dC36872a445adF0bFf63cc0eeee52A2b801625f";

/// A single contract deployment.
///
/// The constructor arguments are kept as the literal strings they were configured with.
/// They are coerced to the ABI types of the constructor inputs by the contract factory,
/// which is also where malformed values are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Contract name, either plain (`StableCashFlow`) or fully qualified
    /// (`contracts/StableCashFlow.sol:StableCashFlow`).
    pub contract: String,
    /// Ordered constructor arguments.
    pub constructor_args: Vec<String>,
}

impl DeploymentRequest {
    pub fn new(
        contract: impl Into<String>,
        constructor_args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            contract: contract.into(),
            constructor_args: constructor_args.into_iter().map(Into::into).collect(),
        }
    }

    /// `StableCashFlow(host, agreement, tokenA, tokenB)`.
    pub fn stable_cash_flow() -> Self {
        Self::new(
            STABLE_CASH_FLOW,
            [
                HOST_ADDRESS,
                AGREEMENT_ADDRESS,
                TOKEN_A_ADDRESS,
                TOKEN_B_ADDRESS,
            ],
        )
    }

    /// The name printed once the contract is deployed.
    ///
    /// For a fully qualified name this is the part after the last `:`.
    pub fn display_name(&self) -> &str {
        self.contract
            .rsplit_once(':')
            .map(|(_, name)| name)
            .unwrap_or(&self.contract)
    }
}

impl Default for DeploymentRequest {
    fn default() -> Self {
        Self::stable_cash_flow()
    }
}
