//! Test helpers: an in-process JSON-RPC node and artifact fixtures.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};

pub const CHAIN_ID: u64 = 31337;
pub const NODE_ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const TX_HASH: &str = "0x6f1d4b8c3a6a8f0c2b7e1f5d9a3c4b2e1d0f9e8d7c6b5a4938271605f4e3d2c1";
pub const DEPLOYED_CODE: &str = "0x6080604052600080fd";

/// Well-known development key, account 0 of the default test mnemonic.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Creation bytecode of the fixture artifact.
pub const CREATION_CODE: &str = "0x6080604052348015600f57600080fd5b50";

/// How the mock node answers.
#[derive(Debug, Clone)]
pub struct NodeBehavior {
    pub chain_id: u64,
    pub accounts: Vec<String>,
    /// Number of receipt polls answered with `null` before the receipt is returned.
    pub pending_receipt_polls: usize,
    pub reverts: bool,
    pub code: String,
    pub base_fee: Option<u128>,
    pub block_number: u64,
    pub send_error: Option<String>,
}

impl Default for NodeBehavior {
    fn default() -> Self {
        Self {
            chain_id: CHAIN_ID,
            accounts: vec![NODE_ACCOUNT.to_string()],
            pending_receipt_polls: 2,
            reverts: false,
            code: DEPLOYED_CODE.to_string(),
            base_fee: Some(1_000_000_000),
            block_number: 1,
            send_error: None,
        }
    }
}

struct NodeState {
    behavior: NodeBehavior,
    calls: Vec<(String, Value)>,
    receipt_polls: usize,
}

/// A JSON-RPC node answering on a random local port.
pub struct MockNode {
    pub url: String,
    state: Arc<Mutex<NodeState>>,
    handle: JoinHandle<()>,
}

impl MockNode {
    pub async fn start(behavior: NodeBehavior) -> Self {
        let state = Arc::new(Mutex::new(NodeState {
            behavior,
            calls: Vec::new(),
            receipt_polls: 0,
        }));

        let app = Router::new()
            .route("/", post(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    /// Params of every call of `method`, in order.
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// Number of creation transactions received, signed by the node or not.
    pub fn sent_transactions(&self) -> usize {
        self.calls("eth_sendTransaction").len() + self.calls("eth_sendRawTransaction").len()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn quantity(value: impl Into<u128>) -> Value {
    json!(format!("0x{:x}", value.into()))
}

async fn handle_request(
    State(state): State<Arc<Mutex<NodeState>>>,
    Json(request): Json<Value>,
) -> Json<Value> {
    Json(respond(&state, &request))
}

fn respond(state: &Mutex<NodeState>, request: &Value) -> Value {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();

    let mut state = state.lock().unwrap();
    state.calls.push((method.clone(), params));
    let behavior = state.behavior.clone();

    let result: Result<Value, String> = match method.as_str() {
        "eth_chainId" => Ok(quantity(behavior.chain_id)),
        "eth_accounts" => Ok(json!(behavior.accounts)),
        "eth_getTransactionCount" => Ok(quantity(0u64)),
        "eth_estimateGas" => Ok(quantity(3_000_000u64)),
        "eth_maxPriorityFeePerGas" => Ok(quantity(1_000_000_000u64)),
        "eth_gasPrice" => Ok(quantity(2_000_000_000u64)),
        "eth_blockNumber" => Ok(quantity(behavior.block_number)),
        "eth_getBlockByNumber" => {
            let mut block = json!({
                "number": quantity(behavior.block_number),
                "timestamp": "0x0",
            });
            if let Some(base_fee) = behavior.base_fee {
                block["baseFeePerGas"] = quantity(base_fee);
            }
            Ok(block)
        }
        "eth_sendTransaction" | "eth_sendRawTransaction" => match behavior.send_error {
            Some(message) => Err(message),
            None => Ok(json!(TX_HASH)),
        },
        "eth_getTransactionReceipt" => {
            if state.receipt_polls < behavior.pending_receipt_polls {
                state.receipt_polls += 1;
                Ok(Value::Null)
            } else {
                let (contract_address, status) = if behavior.reverts {
                    (Value::Null, "0x0")
                } else {
                    (json!(CONTRACT_ADDRESS), "0x1")
                };
                Ok(json!({
                    "transactionHash": TX_HASH,
                    "blockNumber": quantity(behavior.block_number),
                    "contractAddress": contract_address,
                    "status": status,
                    "gasUsed": quantity(1_234_567u64),
                    "logs": [],
                }))
            }
        }
        "eth_getCode" => Ok(json!(behavior.code)),
        other => Err(format!("the method {} does not exist/is not available", other)),
    };

    match result {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": -32000, "message": message },
        }),
    }
}

/// Write the `StableCashFlow` artifact the way the contract toolchain lays it out.
pub fn write_stable_cash_flow_artifact(root: &Path) {
    let dir = root.join("contracts/StableCashFlow.sol");
    std::fs::create_dir_all(&dir).unwrap();

    let address_input = |name: &str| json!({ "name": name, "type": "address", "internalType": "address" });
    let artifact = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": "StableCashFlow",
        "sourceName": "contracts/StableCashFlow.sol",
        "abi": [
            {
                "type": "constructor",
                "stateMutability": "nonpayable",
                "inputs": [
                    address_input("host"),
                    address_input("cfa"),
                    address_input("tokenA"),
                    address_input("tokenB"),
                ],
            },
            {
                "type": "function",
                "name": "afterAgreementCreated",
                "stateMutability": "nonpayable",
                "inputs": [],
                "outputs": [],
            }
        ],
        "bytecode": CREATION_CODE,
        "deployedBytecode": DEPLOYED_CODE,
        "linkReferences": {},
        "deployedLinkReferences": {},
    });

    std::fs::write(
        dir.join("StableCashFlow.json"),
        serde_json::to_string_pretty(&artifact).unwrap(),
    )
    .unwrap();
}
