//! Compiled contract artifacts.
//!
//! Artifacts are the JSON files produced by the contract toolchain, laid out as
//! `<root>/<source name>/<contract name>.json`, e.g.
//! `artifacts/contracts/StableCashFlow.sol/StableCashFlow.json`.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::json_abi::JsonAbi;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Directory holding compiler build info, never contains contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// Suffix of the debug files written next to each artifact.
const DEBUG_FILE_SUFFIX: &str = ".dbg.json";

/// A compiled contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    /// Creation bytecode as a hex string.
    ///
    /// Kept as text since unlinked bytecode contains library placeholders that are not valid hex.
    pub bytecode: String,
    /// Libraries that must be linked into the creation bytecode, keyed by source then library name.
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Artifact {
    /// The `<source name>:<contract name>` identifier of this artifact.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }
}

/// Lookup of compiled artifacts by contract name.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the artifact of a contract.
    ///
    /// `name` is either a plain contract name, which must be unique across all sources,
    /// or a fully qualified `<source name>:<contract name>`.
    pub fn find(&self, name: &str) -> Result<Artifact> {
        if !self.root.is_dir() {
            anyhow::bail!(
                "Artifacts directory not found: {}. Compile the contracts first.",
                self.root.display()
            );
        }

        if let Some((source_name, contract_name)) = name.rsplit_once(':') {
            return self.find_fully_qualified(source_name, contract_name);
        }

        let file_name = format!("{name}.json");
        let mut candidates = Vec::new();
        self.collect_candidates(&self.root, &file_name, &mut candidates)?;

        let mut matches = Vec::new();
        for path in candidates {
            let artifact = Artifact::load(&path)?;
            if artifact.contract_name == name {
                matches.push(artifact);
            }
        }

        match matches.len() {
            0 => anyhow::bail!(
                "Artifact for contract \"{}\" not found in {}",
                name,
                self.root.display()
            ),
            1 => Ok(matches.remove(0)),
            _ => {
                let names: Vec<String> = matches.iter().map(Artifact::fully_qualified_name).collect();
                anyhow::bail!(
                    "Multiple artifacts for contract \"{}\", use one of these fully qualified names instead: {}",
                    name,
                    names.join(", ")
                )
            }
        }
    }

    fn find_fully_qualified(&self, source_name: &str, contract_name: &str) -> Result<Artifact> {
        let path = self
            .root
            .join(source_name)
            .join(format!("{contract_name}.json"));

        if !path.is_file() {
            anyhow::bail!(
                "Artifact for contract \"{}:{}\" not found at {}",
                source_name,
                contract_name,
                path.display()
            );
        }

        let artifact = Artifact::load(&path)?;
        if artifact.contract_name != contract_name {
            anyhow::bail!(
                "Artifact {} contains contract \"{}\", expected \"{}\"",
                path.display(),
                artifact.contract_name,
                contract_name
            );
        }

        Ok(artifact)
    }

    fn collect_candidates(&self, dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read artifacts directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry.context("Failed to read artifacts directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                if dir == self.root && entry.file_name() == BUILD_INFO_DIR {
                    continue;
                }
                self.collect_candidates(&path, file_name, out)?;
            } else {
                let entry_name = entry.file_name();
                let entry_name = entry_name.to_string_lossy();
                if entry_name == file_name && !entry_name.ends_with(DEBUG_FILE_SUFFIX) {
                    out.push(path);
                }
            }
        }

        Ok(())
    }
}
