//! Contract factory: turns an artifact and constructor arguments into deployment data.

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    primitives::{Address, Bytes},
};
use anyhow::{Context, Result};

use crate::artifacts::Artifact;

/// Deploys new instances of a single compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    artifact: Artifact,
    bytecode: Bytes,
}

impl ContractFactory {
    /// Create a factory from an artifact.
    ///
    /// Fails for contracts without creation bytecode (interfaces, abstract contracts)
    /// and for contracts that need libraries linked in.
    pub fn new(artifact: Artifact) -> Result<Self> {
        if !artifact.link_references.is_empty() {
            let libraries: Vec<String> = artifact
                .link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect();
            anyhow::bail!(
                "Contract \"{}\" needs libraries to be linked before deployment: {}",
                artifact.contract_name,
                libraries.join(", ")
            );
        }

        let bytecode: Bytes = artifact.bytecode.parse().with_context(|| {
            format!(
                "Invalid creation bytecode in artifact of \"{}\"",
                artifact.contract_name
            )
        })?;

        if bytecode.is_empty() {
            anyhow::bail!(
                "Contract \"{}\" has no creation bytecode, abstract contracts and interfaces cannot be deployed",
                artifact.contract_name
            );
        }

        Ok(Self { artifact, bytecode })
    }

    pub fn contract_name(&self) -> &str {
        &self.artifact.contract_name
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Coerce the literal constructor arguments to the ABI constructor input types.
    pub fn constructor_values(&self, args: &[String]) -> Result<Vec<DynSolValue>> {
        let inputs = self
            .artifact
            .abi
            .constructor
            .as_ref()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != args.len() {
            anyhow::bail!(
                "Contract \"{}\" constructor expects {} arguments, got {}",
                self.artifact.contract_name,
                inputs.len(),
                args.len()
            );
        }

        inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().with_context(|| {
                    format!("Unsupported constructor parameter type {}", param.ty)
                })?;
                if ty == DynSolType::Address && is_mixed_case(arg) {
                    Address::parse_checksummed(arg.trim(), None).with_context(|| {
                        format!(
                            "Bad checksum in address \"{}\" for constructor parameter `{}`",
                            arg, param.name
                        )
                    })?;
                }
                ty.coerce_str(arg).with_context(|| {
                    format!(
                        "Invalid value \"{}\" for constructor parameter `{}` of type {}",
                        arg, param.name, param.ty
                    )
                })
            })
            .collect()
    }

    /// ABI-encoded constructor arguments.
    pub fn encode_constructor_args(&self, args: &[String]) -> Result<Vec<u8>> {
        let values = self.constructor_values(args)?;

        match &self.artifact.abi.constructor {
            Some(constructor) => constructor
                .abi_encode_input(&values)
                .context("Failed to encode constructor arguments"),
            None => Ok(Vec::new()),
        }
    }

    /// Creation transaction input: the creation bytecode followed by the encoded constructor arguments.
    pub fn deploy_data(&self, args: &[String]) -> Result<Bytes> {
        let encoded = self.encode_constructor_args(args)?;

        let mut data = Vec::with_capacity(self.bytecode.len() + encoded.len());
        data.extend_from_slice(&self.bytecode);
        data.extend_from_slice(&encoded);

        Ok(data.into())
    }
}

/// Hex literals mixing upper and lower case letters carry an EIP-55 checksum.
fn is_mixed_case(literal: &str) -> bool {
    let digits = literal.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    digits.chars().any(|c| c.is_ascii_uppercase()) && digits.chars().any(|c| c.is_ascii_lowercase())
}
