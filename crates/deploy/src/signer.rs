//! Transaction senders: node-managed accounts and local private keys.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_core::primitives::{Address, Bytes, TxKind, U256};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

/// Fee parameters of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Fees {
    /// EIP-1559 fees.
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    /// Pre EIP-1559 gas price.
    Legacy { gas_price: u128 },
}

impl Fees {
    /// EIP-1559 fees allowing the base fee to double before the transaction is priced out.
    pub fn eip1559(base_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        Self::Eip1559 {
            max_fee_per_gas: base_fee_per_gas
                .saturating_mul(2)
                .saturating_add(max_priority_fee_per_gas),
            max_priority_fee_per_gas,
        }
    }
}

/// A contract creation transaction, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fees: Fees,
    pub input: Bytes,
}

impl CreationTx {
    /// Sign the transaction and return its EIP-2718 encoding.
    pub fn sign(&self, signer: &PrivateKeySigner) -> Result<Bytes> {
        let envelope: TxEnvelope = match self.fees {
            Fees::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let tx = TxEip1559 {
                    chain_id: self.chain_id,
                    nonce: self.nonce,
                    gas_limit: self.gas_limit,
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                    to: TxKind::Create,
                    value: U256::ZERO,
                    access_list: Default::default(),
                    input: self.input.clone(),
                };
                let signature = signer
                    .sign_hash_sync(&tx.signature_hash())
                    .context("Failed to sign deployment transaction")?;
                tx.into_signed(signature).into()
            }
            Fees::Legacy { gas_price } => {
                let tx = TxLegacy {
                    chain_id: Some(self.chain_id),
                    nonce: self.nonce,
                    gas_price,
                    gas_limit: self.gas_limit,
                    to: TxKind::Create,
                    value: U256::ZERO,
                    input: self.input.clone(),
                };
                let signature = signer
                    .sign_hash_sync(&tx.signature_hash())
                    .context("Failed to sign deployment transaction")?;
                tx.into_signed(signature).into()
            }
        };

        Ok(envelope.encoded_2718().into())
    }
}

/// The account deploying the contract.
#[derive(Debug, Clone)]
pub enum TxSender {
    /// An account unlocked on the node, transactions are signed by the node.
    Node(Address),
    /// A local private key, transactions are signed before being sent.
    Local(PrivateKeySigner),
}

impl TxSender {
    /// Parse a hex encoded private key, with or without `0x` prefix.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .context("Invalid private key")?;
        Ok(Self::Local(signer))
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Node(address) => *address,
            Self::Local(signer) => signer.address(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Node(_) => "node",
            Self::Local(_) => "local",
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::hex;

    use super::*;

    // Well-known development key, account 0 of the default test mnemonic.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_local_sender_address() {
        let sender = TxSender::from_private_key(DEV_KEY).unwrap();
        assert_eq!(sender.address(), DEV_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(sender.kind(), "local");

        let unprefixed = TxSender::from_private_key(DEV_KEY.trim_start_matches("0x")).unwrap();
        assert_eq!(unprefixed.address(), sender.address());
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(TxSender::from_private_key("0x1234").is_err());
        assert!(TxSender::from_private_key("not a key").is_err());
    }

    #[test]
    fn test_eip1559_fees() {
        assert_eq!(
            Fees::eip1559(10, 2),
            Fees::Eip1559 {
                max_fee_per_gas: 22,
                max_priority_fee_per_gas: 2
            }
        );
        assert_eq!(Fees::Legacy { gas_price: 1 }.to_string(), "legacy");
    }

    #[test]
    fn test_signed_transaction_encoding() {
        let TxSender::Local(signer) = TxSender::from_private_key(DEV_KEY).unwrap() else {
            panic!("expected a local sender");
        };
        let input = Bytes::from(vec![0x60, 0x80, 0x60, 0x40]);

        let eip1559 = CreationTx {
            chain_id: 31337,
            nonce: 0,
            gas_limit: 3_000_000,
            fees: Fees::eip1559(1_000_000_000, 1_000_000_000),
            input: input.clone(),
        }
        .sign(&signer)
        .unwrap();
        // Typed transaction envelope.
        assert_eq!(eip1559[0], 0x02);
        assert!(hex::encode(&eip1559).contains("60806040"));

        let legacy = CreationTx {
            chain_id: 31337,
            nonce: 0,
            gas_limit: 3_000_000,
            fees: Fees::Legacy {
                gas_price: 1_000_000_000,
            },
            input,
        }
        .sign(&signer)
        .unwrap();
        // Legacy transactions are a bare RLP list.
        assert!(legacy[0] >= 0xc0);
    }
}
