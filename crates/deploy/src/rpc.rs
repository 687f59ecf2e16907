//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::{future::Future, time::Duration};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for RPC requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(value: &str) -> Result<u128, anyhow::Error> {
    let digits = value
        .strip_prefix("0x")
        .with_context(|| format!("Quantity is not 0x-prefixed: {}", value))?;
    u128::from_str_radix(digits, 16).with_context(|| format!("Invalid hex quantity: {}", value))
}

/// Parse a `0x`-prefixed hex quantity that must fit in a `u64`.
pub fn parse_quantity_u64(value: &str) -> Result<u64, anyhow::Error> {
    let quantity = parse_quantity(value)?;
    u64::try_from(quantity).with_context(|| format!("Quantity out of range: {}", value))
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_quantity_u64(&s).map_err(serde::de::Error::custom)
}

/// Deserialize an optional u64 from a hex string (with 0x prefix).
fn deserialize_opt_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| parse_quantity_u64(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Deserialize an optional u128 from a hex string (with 0x prefix).
fn deserialize_opt_u128_from_hex<'de, D>(deserializer: D) -> std::result::Result<Option<u128>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| parse_quantity(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Block header fields needed to price a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub number: u64,
    /// Absent on chains without EIP-1559.
    #[serde(default, deserialize_with = "deserialize_opt_u128_from_hex")]
    pub base_fee_per_gas: Option<u128>,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `1` for success, `0` for a reverted transaction. Absent before Byzantium.
    #[serde(default, deserialize_with = "deserialize_opt_u64_from_hex")]
    pub status: Option<u64>,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub gas_used: u64,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

/// Typed wrapper around the JSON-RPC methods used for a deployment.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: create_client(request_timeout)?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, anyhow::Error> {
        json_rpc_call(&self.client, &self.url, method, params).await
    }

    async fn call_quantity(&self, method: &str, params: Vec<Value>) -> Result<u128, anyhow::Error> {
        let quantity: String = self.call(method, params).await?;
        parse_quantity(&quantity)
    }

    pub async fn chain_id(&self) -> Result<u64, anyhow::Error> {
        let chain_id: String = self.call("eth_chainId", vec![]).await?;
        parse_quantity_u64(&chain_id)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, anyhow::Error> {
        self.call("eth_accounts", vec![]).await
    }

    /// Nonce of the next transaction of `address`, including pending transactions.
    pub async fn pending_nonce(&self, address: Address) -> Result<u64, anyhow::Error> {
        let nonce: String = self
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        parse_quantity_u64(&nonce)
    }

    pub async fn estimate_gas(&self, from: Address, data: &Bytes) -> Result<u64, anyhow::Error> {
        let gas: String = self
            .call(
                "eth_estimateGas",
                vec![serde_json::json!({ "from": from, "data": data })],
            )
            .await?;
        parse_quantity_u64(&gas)
    }

    pub async fn latest_block(&self) -> Result<BlockInfo, anyhow::Error> {
        self.call(
            "eth_getBlockByNumber",
            vec![serde_json::json!("latest"), serde_json::json!(false)],
        )
        .await
    }

    pub async fn max_priority_fee_per_gas(&self) -> Result<u128, anyhow::Error> {
        self.call_quantity("eth_maxPriorityFeePerGas", vec![]).await
    }

    pub async fn gas_price(&self) -> Result<u128, anyhow::Error> {
        self.call_quantity("eth_gasPrice", vec![]).await
    }

    pub async fn block_number(&self) -> Result<u64, anyhow::Error> {
        let number: String = self.call("eth_blockNumber", vec![]).await?;
        parse_quantity_u64(&number)
    }

    /// Send a transaction signed by the node.
    pub async fn send_transaction(&self, tx: Value) -> Result<B256, anyhow::Error> {
        self.call("eth_sendTransaction", vec![tx]).await
    }

    /// Send a locally signed, EIP-2718 encoded transaction.
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, anyhow::Error> {
        self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
            .await
    }

    /// The receipt of a transaction, `None` while it is not mined.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, anyhow::Error> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }

    pub async fn code(&self, address: Address) -> Result<Bytes, anyhow::Error> {
        self.call(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }
}

/// Wait for a condition by repeatedly calling a check function.
///
/// # Arguments
/// * `name` - Name of the awaited condition (for error messages)
/// * `timeout` - Maximum time to wait
/// * `poll_interval` - Time between two checks
/// * `check_fn` - Function that returns `Ok(Some(_))` once the condition holds
///
/// Errors returned by `check_fn` are retried until the timeout.
///
/// # Returns
/// The value produced by the successful check, or an error after timeout.
pub async fn wait_until_ready<T, F, Fut>(
    name: &str,
    timeout: Duration,
    poll_interval: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let mut last_error = None;

    loop {
        match check_fn().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                tracing::trace!(condition = %name, "Not ready yet, retrying...");
            }
            Err(e) => {
                tracing::trace!(error = %e, condition = %name, "Check failed, retrying...");
                last_error = Some(e);
            }
        }

        if start.elapsed() > timeout {
            return Err(match last_error {
                Some(e) => e.context(format!("Timeout waiting for {}", name)),
                None => anyhow::anyhow!("Timeout waiting for {}", name),
            });
        }

        tokio::time::sleep(poll_interval).await;
    }
}
